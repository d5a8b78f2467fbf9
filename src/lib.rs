mod sys;
mod config;
mod params;
mod capture;
mod session;
pub mod status;

use status::Status;

#[derive(Debug)]
pub enum Error {
    DeviceNotFound,
    DeviceBusyOrFaulted(Status),
    PowerConfiguration(Status),
    InvalidParameter { call: &'static str, status: Status },
    InvalidDownsampleRatio,
    BufferOverflow(ChannelSet),
    StaleHandle,
    InvalidState { operation: &'static str, state: State },
    ChannelNotEnabled(Channel),
    ChannelNotArmed(Channel),
    NoChannelsArmed,
    InvalidBufferLength(usize),
    BufferLengthMismatch { channel: Channel, length: usize, expected: usize },
    RatioModeMismatch { channel: Channel, armed: RatioMode, requested: RatioMode },
    /// The reported samples do not fit the buffer. `overflow` is what the same poll reported.
    BufferBounds { start: usize, count: usize, capacity: usize, overflow: ChannelSet },
    Driver { call: &'static str, status: Status },
    Library(libloading::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::DeviceNotFound =>
                write!(f, "no oscilloscope found"),
            Self::DeviceBusyOrFaulted(status) =>
                write!(f, "failed to open oscilloscope: {} ({:#x})", status::name(*status), status),
            Self::PowerConfiguration(status) =>
                write!(f, "failed to change power source: {} ({:#x})", status::name(*status), status),
            Self::InvalidParameter { call, status } =>
                write!(f, "{} rejected its parameters: {} ({:#x})", call, status::name(*status), status),
            Self::InvalidDownsampleRatio =>
                write!(f, "invalid downsample ratio"),
            Self::BufferOverflow(channels) =>
                write!(f, "overflow on channel(s) {:?}", channels.channels().collect::<Vec<_>>()),
            Self::StaleHandle =>
                write!(f, "device handle is closed"),
            Self::InvalidState { operation, state } =>
                write!(f, "{} is not valid while the session is {:?}", operation, state),
            Self::ChannelNotEnabled(channel) =>
                write!(f, "channel {} is not enabled", channel),
            Self::ChannelNotArmed(channel) =>
                write!(f, "channel {} has no buffer armed", channel),
            Self::NoChannelsArmed =>
                write!(f, "no channel has a buffer armed"),
            Self::InvalidBufferLength(length) =>
                write!(f, "buffer length {} is out of range", length),
            Self::BufferLengthMismatch { channel, length, expected } =>
                write!(f, "buffer length {} for channel {} does not match armed length {}",
                       length, channel, expected),
            Self::RatioModeMismatch { channel, armed, requested } =>
                write!(f, "channel {} buffer is armed for {:?}, streaming requested {:?}",
                       channel, armed, requested),
            Self::BufferBounds { start, count, capacity, overflow } if overflow.is_empty() =>
                write!(f, "driver reported {} samples at {}, beyond buffer of {}", count, start, capacity),
            Self::BufferBounds { start, count, capacity, overflow } =>
                write!(f, "driver reported {} samples at {}, beyond buffer of {}, overflow on {:?}",
                       count, start, capacity, overflow),
            Self::Driver { call, status } =>
                write!(f, "{} failed: {} ({:#x})", call, status::name(*status), status),
            Self::Library(error) =>
                write!(f, "cannot load driver library: {}", error),
            Self::Io(io_error) =>
                write!(f, "I/O error: {}", io_error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Library(error) => Some(error),
            Self::Io(io_error) => Some(io_error),
            _ => None
        }
    }
}

impl From<libloading::Error> for Error {
    fn from(error: libloading::Error) -> Self {
        Error::Library(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use sys::{
    Driver,
    Handle,
    StreamingReady,
};

pub use sys::ps4000a::Ps4000aDriverImpl;

pub use config::{
    SessionConfig,
    ChannelConfiguration,
};

pub use params::{
    Channel,
    ChannelSet,
    Coupling,
    Range,
    TimeUnit,
    SampleInterval,
    RatioMode,
    MAX_ADC_VALUE,
    MIN_ADC_VALUE,
};

pub use capture::{
    ChannelBuffer,
    StreamingEvent,
};

pub use session::{
    Session,
    State,
    Timebase,
};
