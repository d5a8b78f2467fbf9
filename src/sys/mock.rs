//! Scripted stand-in for the vendor library used by unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use libc::c_void;

use crate::status::{self, Status};
use super::{Driver, Handle, StreamingReady};

pub const MOCK_HANDLE: Handle = 16384;

/// One invocation of the streaming callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct Batch {
    pub count: i32,
    pub start: u32,
    pub overflow: i16,
    pub trigger_at: Option<u32>,
    pub auto_stop: bool,
}

impl Batch {
    pub fn new(start: u32, count: i32) -> Batch {
        Batch { count, start, ..Default::default() }
    }
}

/// Sample value the mock writes for `channel` at buffer `index`.
pub fn sample_at(channel: i32, index: usize) -> i16 {
    (channel * 1000) as i16 + index as i16
}

#[derive(Debug)]
struct State {
    open_status: Status,
    open_handle: Handle,
    power_source_status: Status,
    set_channel_status: Status,
    set_data_buffer_status: Status,
    run_streaming_status: Status,
    latest_values_status: Status,
    close_status: Status,
    granted_interval: Option<u32>,
    buffers: HashMap<i32, (*mut i16, i32)>,
    batches: VecDeque<Batch>,
    calls: Vec<&'static str>,
    run_streaming_args: Option<(u32, i32, u32, i32, u32)>,
}

#[derive(Debug)]
pub struct MockDriver {
    state: RefCell<State>,
}

impl Default for MockDriver {
    fn default() -> Self {
        MockDriver {
            state: RefCell::new(State {
                open_status: status::PICO_OK,
                open_handle: MOCK_HANDLE,
                power_source_status: status::PICO_OK,
                set_channel_status: status::PICO_OK,
                set_data_buffer_status: status::PICO_OK,
                run_streaming_status: status::PICO_OK,
                latest_values_status: status::PICO_OK,
                close_status: status::PICO_OK,
                granted_interval: None,
                buffers: HashMap::new(),
                batches: VecDeque::new(),
                calls: Vec::new(),
                run_streaming_args: None,
            })
        }
    }
}

impl MockDriver {
    pub fn new() -> MockDriver {
        Self::default()
    }

    pub fn with_open_result(self, status: Status, handle: Handle) -> MockDriver {
        {
            let mut state = self.state.borrow_mut();
            state.open_status = status;
            state.open_handle = handle;
        }
        self
    }

    pub fn with_power_source_status(self, status: Status) -> MockDriver {
        self.state.borrow_mut().power_source_status = status;
        self
    }

    pub fn set_channel_status(&self, status: Status) {
        self.state.borrow_mut().set_channel_status = status;
    }

    pub fn set_data_buffer_status(&self, status: Status) {
        self.state.borrow_mut().set_data_buffer_status = status;
    }

    pub fn set_run_streaming_status(&self, status: Status) {
        self.state.borrow_mut().run_streaming_status = status;
    }

    pub fn set_latest_values_status(&self, status: Status) {
        self.state.borrow_mut().latest_values_status = status;
    }

    pub fn set_close_status(&self, status: Status) {
        self.state.borrow_mut().close_status = status;
    }

    pub fn grant_interval(&self, value: u32) {
        self.state.borrow_mut().granted_interval = Some(value);
    }

    pub fn push_batch(&self, batch: Batch) {
        self.state.borrow_mut().batches.push_back(batch);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.state.borrow().calls.iter().filter(|&&name| name == call).count()
    }

    pub fn registered_length(&self, channel: i32) -> Option<i32> {
        self.state.borrow().buffers.get(&channel).map(|&(_, length)| length)
    }

    /// Interval, time units, ratio, mode and buffer size of the last `run_streaming`.
    pub fn run_streaming_args(&self) -> Option<(u32, i32, u32, i32, u32)> {
        self.state.borrow().run_streaming_args
    }

    fn record(&self, call: &'static str) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl Driver for MockDriver {
    fn open_unit(&self, handle: &mut Handle) -> Status {
        self.record("ps4000aOpenUnit");
        let state = self.state.borrow();
        *handle = state.open_handle;
        state.open_status
    }

    fn close_unit(&self, _handle: Handle) -> Status {
        self.record("ps4000aCloseUnit");
        let mut state = self.state.borrow_mut();
        state.buffers.clear();
        state.close_status
    }

    fn change_power_source(&self, _handle: Handle, _power_state: Status) -> Status {
        self.record("ps4000aChangePowerSource");
        self.state.borrow().power_source_status
    }

    fn set_channel(&self, _handle: Handle, _channel: i32, _enabled: i16, _coupling: i32, _range: i32,
                   _analog_offset: f32) -> Status {
        self.record("ps4000aSetChannel");
        self.state.borrow().set_channel_status
    }

    unsafe fn set_data_buffer(&self, _handle: Handle, channel: i32, buffer: *mut i16, length: i32,
                              _segment_index: u32, _mode: i32) -> Status {
        self.record("ps4000aSetDataBuffer");
        let mut state = self.state.borrow_mut();
        if state.set_data_buffer_status != status::PICO_OK {
            return state.set_data_buffer_status
        }
        if buffer.is_null() {
            state.buffers.remove(&channel);
        } else {
            state.buffers.insert(channel, (buffer, length));
        }
        status::PICO_OK
    }

    fn run_streaming(&self, _handle: Handle, sample_interval: &mut u32, time_units: i32,
                     _max_pre_trigger_samples: u32, _max_post_trigger_samples: u32, _auto_stop: i16,
                     downsample_ratio: u32, downsample_mode: i32, buffer_size: u32) -> Status {
        self.record("ps4000aRunStreaming");
        let mut state = self.state.borrow_mut();
        state.run_streaming_args =
            Some((*sample_interval, time_units, downsample_ratio, downsample_mode, buffer_size));
        if state.run_streaming_status == status::PICO_OK {
            if let Some(value) = state.granted_interval {
                *sample_interval = value;
            }
        }
        state.run_streaming_status
    }

    unsafe fn get_streaming_latest_values(&self, handle: Handle, callback: StreamingReady,
                                          parameter: *mut c_void) -> Status {
        self.record("ps4000aGetStreamingLatestValues");
        let batch = {
            let mut state = self.state.borrow_mut();
            if state.latest_values_status != status::PICO_OK {
                return state.latest_values_status
            }
            let batch = state.batches.pop_front().unwrap_or_default();
            // fill registered buffers as the device would, never past their end
            for (&channel, &(buffer, length)) in state.buffers.iter() {
                let start = batch.start as usize;
                let end = (start + batch.count.max(0) as usize).min(length as usize);
                for index in start..end {
                    *buffer.add(index) = sample_at(channel, index);
                }
            }
            batch
        };
        callback(
            handle,
            batch.count,
            batch.start,
            batch.overflow,
            batch.trigger_at.unwrap_or(0),
            batch.trigger_at.is_some() as i16,
            batch.auto_stop as i16,
            parameter,
        );
        status::PICO_OK
    }

    fn stop(&self, _handle: Handle) -> Status {
        self.record("ps4000aStop");
        status::PICO_OK
    }

    fn get_timebase(&self, _handle: Handle, timebase: u32, no_samples: i32,
                    time_interval_ns: &mut i32, max_samples: &mut i32, _segment_index: u32) -> Status {
        self.record("ps4000aGetTimebase");
        // 4000A: 12.5 ns * (timebase + 1)
        *time_interval_ns = ((timebase as i32 + 1) * 25) / 2;
        *max_samples = no_samples.max(0) * 16;
        status::PICO_OK
    }
}
