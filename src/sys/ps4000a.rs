use std::fmt;
use std::path::Path;
use std::ptr;

use libc::c_void;
use libloading::Library;

use crate::Result;
use crate::status::Status;
use super::{Driver, Handle, StreamingReady};

type OpenUnit = unsafe extern "system" fn(*mut Handle, *mut i8) -> Status;
type CloseUnit = unsafe extern "system" fn(Handle) -> Status;
type ChangePowerSource = unsafe extern "system" fn(Handle, Status) -> Status;
type SetChannel = unsafe extern "system" fn(Handle, i32, i16, i32, i32, f32) -> Status;
type SetDataBuffer = unsafe extern "system" fn(Handle, i32, *mut i16, i32, u32, i32) -> Status;
type RunStreaming = unsafe extern "system" fn(
    Handle, *mut u32, i32, u32, u32, i16, u32, i32, u32) -> Status;
type GetStreamingLatestValues = unsafe extern "system" fn(Handle, StreamingReady, *mut c_void) -> Status;
type Stop = unsafe extern "system" fn(Handle) -> Status;
type GetTimebase = unsafe extern "system" fn(Handle, u32, i32, *mut i32, *mut i32, u32) -> Status;

/// The vendor `ps4000a` library, loaded at runtime.
pub struct Ps4000aDriverImpl {
    open_unit: OpenUnit,
    close_unit: CloseUnit,
    change_power_source: ChangePowerSource,
    set_channel: SetChannel,
    set_data_buffer: SetDataBuffer,
    run_streaming: RunStreaming,
    get_streaming_latest_values: GetStreamingLatestValues,
    stop: Stop,
    get_timebase: GetTimebase,
    // keeps the function pointers above valid
    _library: Library,
}

impl fmt::Debug for Ps4000aDriverImpl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Ps4000aDriverImpl").field("library", &self._library).finish_non_exhaustive()
    }
}

impl Ps4000aDriverImpl {
    pub fn load(path: &Path) -> Result<Ps4000aDriverImpl> {
        log::debug!("loading driver library {}", path.display());
        // SAFETY: The vendor library has no initialization routines with preconditions, and
        // every symbol is resolved with the signature from `ps4000aApi.h`.
        unsafe {
            let library = Library::new(path)?;
            Ok(Ps4000aDriverImpl {
                open_unit: *library.get::<OpenUnit>(b"ps4000aOpenUnit\0")?,
                close_unit: *library.get::<CloseUnit>(b"ps4000aCloseUnit\0")?,
                change_power_source: *library.get::<ChangePowerSource>(b"ps4000aChangePowerSource\0")?,
                set_channel: *library.get::<SetChannel>(b"ps4000aSetChannel\0")?,
                set_data_buffer: *library.get::<SetDataBuffer>(b"ps4000aSetDataBuffer\0")?,
                run_streaming: *library.get::<RunStreaming>(b"ps4000aRunStreaming\0")?,
                get_streaming_latest_values:
                    *library.get::<GetStreamingLatestValues>(b"ps4000aGetStreamingLatestValues\0")?,
                stop: *library.get::<Stop>(b"ps4000aStop\0")?,
                get_timebase: *library.get::<GetTimebase>(b"ps4000aGetTimebase\0")?,
                _library: library,
            })
        }
    }
}

impl Driver for Ps4000aDriverImpl {
    fn open_unit(&self, handle: &mut Handle) -> Status {
        // SAFETY: A null serial selects the first unit found.
        unsafe { (self.open_unit)(handle, ptr::null_mut()) }
    }

    fn close_unit(&self, handle: Handle) -> Status {
        unsafe { (self.close_unit)(handle) }
    }

    fn change_power_source(&self, handle: Handle, power_state: Status) -> Status {
        unsafe { (self.change_power_source)(handle, power_state) }
    }

    fn set_channel(&self, handle: Handle, channel: i32, enabled: i16, coupling: i32, range: i32,
                   analog_offset: f32) -> Status {
        unsafe { (self.set_channel)(handle, channel, enabled, coupling, range, analog_offset) }
    }

    unsafe fn set_data_buffer(&self, handle: Handle, channel: i32, buffer: *mut i16, length: i32,
                              segment_index: u32, mode: i32) -> Status {
        (self.set_data_buffer)(handle, channel, buffer, length, segment_index, mode)
    }

    fn run_streaming(&self, handle: Handle, sample_interval: &mut u32, time_units: i32,
                     max_pre_trigger_samples: u32, max_post_trigger_samples: u32, auto_stop: i16,
                     downsample_ratio: u32, downsample_mode: i32, buffer_size: u32) -> Status {
        unsafe {
            (self.run_streaming)(handle, sample_interval, time_units, max_pre_trigger_samples,
                max_post_trigger_samples, auto_stop, downsample_ratio, downsample_mode, buffer_size)
        }
    }

    unsafe fn get_streaming_latest_values(&self, handle: Handle, callback: StreamingReady,
                                          parameter: *mut c_void) -> Status {
        (self.get_streaming_latest_values)(handle, callback, parameter)
    }

    fn stop(&self, handle: Handle) -> Status {
        unsafe { (self.stop)(handle) }
    }

    fn get_timebase(&self, handle: Handle, timebase: u32, no_samples: i32,
                    time_interval_ns: &mut i32, max_samples: &mut i32, segment_index: u32) -> Status {
        unsafe {
            (self.get_timebase)(handle, timebase, no_samples, time_interval_ns, max_samples, segment_index)
        }
    }
}
