//! Session and channel configuration.

use std::path::PathBuf;

use crate::params::{Coupling, Range};

#[cfg(target_os = "windows")]
const DEFAULT_LIBRARY_PATH: &str = r"C:\Program Files\Pico Technology\SDK\lib\ps4000a.dll";
#[cfg(target_os = "macos")]
const DEFAULT_LIBRARY_PATH: &str = "/Library/Frameworks/PicoSDK.framework/Libraries/libps4000a/libps4000a.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const DEFAULT_LIBRARY_PATH: &str = "/opt/picoscope/lib/libps4000a.so";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Detail of the session's own diagnostics. Per-poll details are only
    /// emitted at `Debug` and above, raw driver calls at `Trace`.
    pub verbosity: log::LevelFilter,
    /// Location of the `ps4000a` shared library.
    pub library_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verbosity: log::LevelFilter::Info,
            library_path: PathBuf::from(DEFAULT_LIBRARY_PATH),
        }
    }
}

impl SessionConfig {
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self { library_path: path.into(), ..Default::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfiguration {
    pub enabled: bool,
    pub coupling: Coupling,
    pub range: Range,
    /// Analog offset in volts added before digitization.
    pub analog_offset: f32,
}

impl Default for ChannelConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            coupling: Default::default(),
            range: Default::default(),
            analog_offset: 0.0,
        }
    }
}

impl ChannelConfiguration {
    pub fn disabled() -> Self {
        Self { enabled: false, ..Default::default() }
    }
}
