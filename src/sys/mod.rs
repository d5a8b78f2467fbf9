use libc::c_void;

use crate::status::Status;

pub type Handle = i16;

/// `ps4000aStreamingReady`: handle, sample count, start index, overflow,
/// trigger index, triggered, auto stop, user parameter.
pub type StreamingReady = unsafe extern "system" fn(
    Handle, i32, u32, i16, u32, i16, i16, *mut c_void);

/// The `ps4000a` entry points used for streaming capture. Every method
/// returns the raw status of the underlying call.
pub trait Driver {
    fn open_unit(&self, handle: &mut Handle) -> Status;
    fn close_unit(&self, handle: Handle) -> Status;
    fn change_power_source(&self, handle: Handle, power_state: Status) -> Status;

    fn set_channel(&self, handle: Handle, channel: i32, enabled: i16, coupling: i32, range: i32,
                   analog_offset: f32) -> Status;

    /// # Safety
    ///
    /// `buffer` must be null (unregistering the channel) or point to `length` writable
    /// samples that stay valid until the channel is unregistered or the handle is closed.
    unsafe fn set_data_buffer(&self, handle: Handle, channel: i32, buffer: *mut i16, length: i32,
                              segment_index: u32, mode: i32) -> Status;

    #[allow(clippy::too_many_arguments)]
    fn run_streaming(&self, handle: Handle, sample_interval: &mut u32, time_units: i32,
                     max_pre_trigger_samples: u32, max_post_trigger_samples: u32, auto_stop: i16,
                     downsample_ratio: u32, downsample_mode: i32, buffer_size: u32) -> Status;

    /// Invokes `callback` synchronously, before returning, for the samples that arrived
    /// since the previous call.
    ///
    /// # Safety
    ///
    /// `parameter` must be valid for whatever `callback` does with it for the duration of
    /// the call.
    unsafe fn get_streaming_latest_values(&self, handle: Handle, callback: StreamingReady,
                                          parameter: *mut c_void) -> Status;

    fn stop(&self, handle: Handle) -> Status;

    fn get_timebase(&self, handle: Handle, timebase: u32, no_samples: i32,
                    time_interval_ns: &mut i32, max_samples: &mut i32, segment_index: u32) -> Status;
}

impl<D: Driver + ?Sized> Driver for &D {
    fn open_unit(&self, handle: &mut Handle) -> Status {
        (**self).open_unit(handle)
    }

    fn close_unit(&self, handle: Handle) -> Status {
        (**self).close_unit(handle)
    }

    fn change_power_source(&self, handle: Handle, power_state: Status) -> Status {
        (**self).change_power_source(handle, power_state)
    }

    fn set_channel(&self, handle: Handle, channel: i32, enabled: i16, coupling: i32, range: i32,
                   analog_offset: f32) -> Status {
        (**self).set_channel(handle, channel, enabled, coupling, range, analog_offset)
    }

    unsafe fn set_data_buffer(&self, handle: Handle, channel: i32, buffer: *mut i16, length: i32,
                              segment_index: u32, mode: i32) -> Status {
        (**self).set_data_buffer(handle, channel, buffer, length, segment_index, mode)
    }

    fn run_streaming(&self, handle: Handle, sample_interval: &mut u32, time_units: i32,
                     max_pre_trigger_samples: u32, max_post_trigger_samples: u32, auto_stop: i16,
                     downsample_ratio: u32, downsample_mode: i32, buffer_size: u32) -> Status {
        (**self).run_streaming(handle, sample_interval, time_units, max_pre_trigger_samples,
            max_post_trigger_samples, auto_stop, downsample_ratio, downsample_mode, buffer_size)
    }

    unsafe fn get_streaming_latest_values(&self, handle: Handle, callback: StreamingReady,
                                          parameter: *mut c_void) -> Status {
        (**self).get_streaming_latest_values(handle, callback, parameter)
    }

    fn stop(&self, handle: Handle) -> Status {
        (**self).stop(handle)
    }

    fn get_timebase(&self, handle: Handle, timebase: u32, no_samples: i32,
                    time_interval_ns: &mut i32, max_samples: &mut i32, segment_index: u32) -> Status {
        (**self).get_timebase(handle, timebase, no_samples, time_interval_ns, max_samples, segment_index)
    }
}

pub mod ps4000a;

#[cfg(test)]
pub mod mock;
