use std::fmt;

use libc::c_void;

use crate::{Error, Result};
use crate::capture::{ChannelBuffer, StreamingEvent};
use crate::config::{ChannelConfiguration, SessionConfig};
use crate::params::{Channel, ChannelSet, RatioMode, SampleInterval};
use crate::status;
use crate::sys::{Driver, Handle};
use crate::sys::ps4000a::Ps4000aDriverImpl;

const SEGMENT_INDEX: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Open,
    Configured,
    Streaming,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timebase {
    pub interval_ns: i32,
    pub max_samples: i32,
}

/// Arguments of one `ps4000aStreamingReady` invocation.
#[derive(Debug, Clone, Copy)]
struct Ready {
    sample_count: i32,
    start_index: u32,
    overflow: i16,
    trigger_at: u32,
    triggered: i16,
    auto_stop: i16,
}

/// Passed through the driver as the callback's user parameter for the duration of a
/// single `poll`.
#[derive(Debug)]
struct PollContext {
    handle: Handle,
    ready: Option<Ready>,
    invocations: usize,
    foreign_handle: Option<Handle>,
}

// Runs on the driver's call path: record the arguments and return.
unsafe extern "system" fn streaming_ready(handle: Handle, sample_count: i32, start_index: u32,
                                          overflow: i16, trigger_at: u32, triggered: i16,
                                          auto_stop: i16, parameter: *mut c_void) {
    // SAFETY: `parameter` is the `PollContext` owned by `Session::poll`, which outlives the
    // driver call invoking this function.
    let Some(context) = (parameter as *mut PollContext).as_mut() else { return };
    if context.handle != handle {
        context.foreign_handle = Some(handle);
        return
    }
    context.invocations += 1;
    context.ready = Some(Ready { sample_count, start_index, overflow, trigger_at, triggered, auto_stop });
}

/// An open PicoScope 4000A unit and the buffers it streams into.
#[derive(Debug)]
pub struct Session<D: Driver = Ps4000aDriverImpl> {
    driver: D,
    config: SessionConfig,
    handle: Option<Handle>,
    state: State,
    channels: [Option<ChannelConfiguration>; 8],
    enabled: ChannelSet,
    // dropped after `Drop::drop` closes the handle
    buffers: [Option<ChannelBuffer>; 8],
    interval: Option<SampleInterval>,
    samples_received: u64,
    overflow_count: u64,
}

impl Session<Ps4000aDriverImpl> {
    /// Loads the driver from `config.library_path` and opens the first unit found.
    pub fn open(config: SessionConfig) -> Result<Session<Ps4000aDriverImpl>> {
        let driver = Ps4000aDriverImpl::load(&config.library_path)?;
        Self::open_with(driver, config)
    }

    /// Opens a unit, runs `f`, and closes the unit on every exit path.
    pub fn with<T, F>(config: SessionConfig, f: F) -> Result<T>
            where F: FnOnce(&mut Session<Ps4000aDriverImpl>) -> Result<T> {
        Self::open(config)?.run(f)
    }
}

impl<D: Driver> Session<D> {
    pub fn open_with(driver: D, config: SessionConfig) -> Result<Session<D>> {
        let mut handle: Handle = 0;
        let status = driver.open_unit(&mut handle);
        log::debug!("ps4000aOpenUnit() = {} ({:#x}), handle {}", status::name(status), status, handle);
        if handle == 0 {
            return Err(Error::DeviceNotFound)
        } else if handle < 0 {
            return Err(Error::DeviceBusyOrFaulted(status))
        }

        if status::requires_power_change(status) {
            log::warn!("device reports {}, changing power source", status::name(status));
            let power_status = driver.change_power_source(handle, status);
            if power_status != status::PICO_OK {
                Self::abandon(&driver, handle);
                return Err(Error::PowerConfiguration(power_status))
            }
            log::info!("power source changed");
        } else if status != status::PICO_OK {
            Self::abandon(&driver, handle);
            return Err(Error::DeviceBusyOrFaulted(status))
        }

        log::info!("opened oscilloscope, handle {}", handle);
        Ok(Session {
            driver,
            config,
            handle: Some(handle),
            state: State::Open,
            channels: [None; 8],
            enabled: ChannelSet::empty(),
            buffers: Default::default(),
            interval: None,
            samples_received: 0,
            overflow_count: 0,
        })
    }

    fn abandon(driver: &D, handle: Handle) {
        let status = driver.close_unit(handle);
        if status != status::PICO_OK {
            log::error!("failed to close half-opened device: {}", status::name(status));
        }
    }

    /// Runs `f` and closes the session afterwards, whatever `f` returned.
    pub fn run<T, F>(mut self, f: F) -> Result<T>
            where F: FnOnce(&mut Session<D>) -> Result<T> {
        let result = f(&mut self);
        if self.state == State::Closed {
            return result
        }
        match (result, self.close()) {
            (result, Ok(())) => result,
            (Ok(_), Err(close_error)) => Err(close_error),
            (Err(error), Err(close_error)) => {
                log::error!("failed to close device after error: {}", close_error);
                Err(error)
            }
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn handle(&self) -> Option<Handle> {
        self.handle
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn enabled_channels(&self) -> ChannelSet {
        self.enabled
    }

    pub fn armed_channels(&self) -> ChannelSet {
        Channel::ALL.into_iter()
            .filter(|channel| self.buffers[channel.index()].is_some())
            .fold(ChannelSet::empty(), |set, channel| set | ChannelSet::channel(channel))
    }

    pub fn channel_configuration(&self, channel: Channel) -> Option<&ChannelConfiguration> {
        self.channels[channel.index()].as_ref()
    }

    /// Samples per channel shared by every armed buffer.
    pub fn buffer_length(&self) -> Option<usize> {
        self.buffers.iter().flatten().map(ChannelBuffer::len).next()
    }

    /// Sampling interval granted by the driver for the current or last run.
    pub fn sample_interval(&self) -> Option<SampleInterval> {
        self.interval
    }

    pub fn samples_received(&self) -> u64 {
        self.samples_received
    }

    pub fn overflow_count(&self) -> u64 {
        self.overflow_count
    }

    fn diag(&self, level: log::Level, args: fmt::Arguments) {
        if level <= self.config.verbosity {
            log::log!(level, "{}", args);
        }
    }

    fn require(&self, operation: &'static str, allowed: &[State]) -> Result<Handle> {
        match self.handle {
            None => Err(Error::StaleHandle),
            Some(_) if !allowed.contains(&self.state) =>
                Err(Error::InvalidState { operation, state: self.state }),
            Some(handle) => Ok(handle),
        }
    }

    pub fn configure_channel(&mut self, channel: Channel, config: &ChannelConfiguration) -> Result<()> {
        let handle = self.require("configure_channel", &[State::Open, State::Configured])?;
        self.diag(log::Level::Debug, format_args!("configure_channel({}, {:?})", channel, config));
        // unregister before switching off: a failed release leaves the channel armed and on
        if !config.enabled {
            self.release_buffer(handle, channel)?;
        }
        let status = self.driver.set_channel(handle, channel.ps4000a_code(), config.enabled as i16,
            config.coupling.ps4000a_code(), config.range.ps4000a_code(), config.analog_offset);
        self.diag(log::Level::Trace, format_args!("ps4000aSetChannel() = {}", status::name(status)));
        status::check("ps4000aSetChannel", status)?;

        if config.enabled {
            self.enabled.insert(ChannelSet::channel(channel));
        } else {
            self.enabled.remove(ChannelSet::channel(channel));
        }
        self.channels[channel.index()] = Some(*config);
        self.state = State::Configured;
        Ok(())
    }

    fn release_buffer(&mut self, handle: Handle, channel: Channel) -> Result<()> {
        if self.buffers[channel.index()].is_none() {
            return Ok(())
        }
        // SAFETY: A null buffer unregisters the channel.
        let status = unsafe {
            self.driver.set_data_buffer(handle, channel.ps4000a_code(), std::ptr::null_mut(), 0,
                SEGMENT_INDEX, RatioMode::NONE.ps4000a_code())
        };
        status::check("ps4000aSetDataBuffer", status)?;
        self.buffers[channel.index()] = None;
        log::debug!("released buffer of channel {}", channel);
        Ok(())
    }

    pub fn arm_buffer(&mut self, channel: Channel, length: usize) -> Result<()> {
        self.arm_buffer_with_mode(channel, length, RatioMode::NONE)
    }

    /// Allocates a zeroed buffer of `length` samples for `channel` and registers it as
    /// the destination of streamed samples in `mode`. Every armed buffer must have the
    /// same length, which becomes the streaming buffer size.
    pub fn arm_buffer_with_mode(&mut self, channel: Channel, length: usize, mode: RatioMode) -> Result<()> {
        let handle = self.require("arm_buffer", &[State::Configured])?;
        if !self.enabled.contains_channel(channel) {
            return Err(Error::ChannelNotEnabled(channel))
        }
        if length == 0 || length > i32::MAX as usize {
            return Err(Error::InvalidBufferLength(length))
        }
        let other_length = self.buffers.iter().enumerate()
            .filter(|&(index, _)| index != channel.index())
            .find_map(|(_, buffer)| buffer.as_ref().map(ChannelBuffer::len));
        if let Some(expected) = other_length {
            if expected != length {
                return Err(Error::BufferLengthMismatch { channel, length, expected })
            }
        }

        let buffer = ChannelBuffer::new(length, mode);
        // SAFETY: The buffer is stored in `self.buffers` below and only freed after it has
        // been replaced, unregistered, or the handle has been closed.
        let status = unsafe {
            self.driver.set_data_buffer(handle, channel.ps4000a_code(), buffer.as_mut_ptr(),
                length as i32, SEGMENT_INDEX, mode.ps4000a_code())
        };
        self.diag(log::Level::Trace, format_args!("ps4000aSetDataBuffer() = {}", status::name(status)));
        status::check("ps4000aSetDataBuffer", status)?;
        self.buffers[channel.index()] = Some(buffer);
        self.diag(log::Level::Debug,
            format_args!("armed channel {} with {} samples ({:?})", channel, length, mode));
        Ok(())
    }

    /// Starts continuous acquisition into the armed buffers. Returns the sampling
    /// interval the driver actually granted, in the requested unit.
    pub fn start_streaming(&mut self, interval: SampleInterval, downsample_ratio: u32,
                           downsample_mode: RatioMode) -> Result<SampleInterval> {
        let handle = self.require("start_streaming", &[State::Configured])?;
        for channel in self.enabled.channels() {
            match &self.buffers[channel.index()] {
                None =>
                    return Err(Error::ChannelNotArmed(channel)),
                Some(buffer) if buffer.mode() != downsample_mode =>
                    return Err(Error::RatioModeMismatch {
                        channel,
                        armed: buffer.mode(),
                        requested: downsample_mode,
                    }),
                Some(_) => (),
            }
        }
        let length = self.buffer_length().ok_or(Error::NoChannelsArmed)?;

        let mut granted = interval.value;
        let status = self.driver.run_streaming(handle, &mut granted, interval.unit.ps4000a_code(),
            0, 0, false as i16, downsample_ratio, downsample_mode.ps4000a_code(), length as u32);
        self.diag(log::Level::Trace, format_args!("ps4000aRunStreaming() = {}", status::name(status)));
        status::check("ps4000aRunStreaming", status)?;

        let granted = SampleInterval::new(granted, interval.unit);
        log::info!("streaming channel(s) {:?} every {} {:?}, {} samples per buffer",
                   self.enabled.channels().collect::<Vec<_>>(), granted.value, granted.unit, length);
        self.interval = Some(granted);
        self.samples_received = 0;
        self.overflow_count = 0;
        self.state = State::Streaming;
        Ok(granted)
    }

    /// Collects whatever the driver received since the previous poll. The returned event
    /// names the slice of each armed buffer that is newly valid.
    pub fn poll(&mut self) -> Result<StreamingEvent> {
        let handle = self.require("poll", &[State::Streaming])?;
        let mut context = PollContext { handle, ready: None, invocations: 0, foreign_handle: None };
        // SAFETY: `context` outlives the call, and `streaming_ready` only accesses it as a
        // `PollContext`.
        let status = unsafe {
            self.driver.get_streaming_latest_values(handle, streaming_ready,
                &mut context as *mut PollContext as *mut c_void)
        };
        if status == status::PICO_BUSY {
            self.diag(log::Level::Debug, format_args!("poll: driver busy"));
            return Ok(StreamingEvent::default())
        }
        status::check("ps4000aGetStreamingLatestValues", status)?;
        if let Some(foreign_handle) = context.foreign_handle {
            log::warn!("ignored streaming callback for handle {}", foreign_handle);
        }
        if context.invocations > 1 {
            log::warn!("streaming callback ran {} times in one poll, keeping the last",
                       context.invocations);
        }

        let Some(ready) = context.ready else {
            self.diag(log::Level::Debug, format_args!("poll: no callback"));
            return Ok(StreamingEvent::default())
        };
        let sample_count = match usize::try_from(ready.sample_count) {
            Ok(count) => count,
            Err(_) => {
                log::warn!("driver reported {} samples, treating as none", ready.sample_count);
                0
            }
        };
        let event = StreamingEvent {
            sample_count,
            start_index: ready.start_index as usize,
            overflow: ChannelSet::from_bits_truncate(ready.overflow as u16),
            trigger_at: (ready.triggered != 0).then_some(ready.trigger_at as usize),
            auto_stop: ready.auto_stop != 0,
        };

        if event.overflowed() {
            self.overflow_count += 1;
            log::warn!("overflow on channel(s) {:?}", event.overflow.channels().collect::<Vec<_>>());
        }
        let capacity = self.buffer_length().unwrap_or(0);
        if !event.end().is_some_and(|end| end <= capacity) {
            log::error!("driver reported {} samples at {} beyond buffer of {}",
                        event.sample_count, event.start_index, capacity);
            return Err(Error::BufferBounds {
                start: event.start_index,
                count: event.sample_count,
                capacity,
                overflow: event.overflow,
            })
        }

        self.samples_received += event.sample_count as u64;
        if let Some(trigger_at) = event.trigger_at {
            self.diag(log::Level::Info, format_args!("triggered at sample {}", event.start_index + trigger_at));
        }
        if event.auto_stop {
            log::info!("device stopped streaming on its own");
        }
        self.diag(log::Level::Debug,
            format_args!("poll: {} samples at {}", event.sample_count, event.start_index));
        Ok(event)
    }

    /// The samples of `channel` that `event` reported as new.
    pub fn samples(&self, channel: Channel, event: &StreamingEvent) -> Result<&[i16]> {
        self.buffer(channel)?.window(event.start_index, event.sample_count)
    }

    pub fn buffer(&self, channel: Channel) -> Result<&ChannelBuffer> {
        self.require("buffer", &[State::Configured, State::Streaming])?;
        self.buffers[channel.index()].as_ref().ok_or(Error::ChannelNotArmed(channel))
    }

    pub fn timebase(&mut self, timebase: u32, samples: usize) -> Result<Timebase> {
        let handle = self.require("timebase", &[State::Open, State::Configured, State::Streaming])?;
        let samples = i32::try_from(samples).map_err(|_| Error::InvalidBufferLength(samples))?;
        let mut interval_ns = 0;
        let mut max_samples = 0;
        let status = self.driver.get_timebase(handle, timebase, samples, &mut interval_ns,
            &mut max_samples, SEGMENT_INDEX);
        status::check("ps4000aGetTimebase", status)?;
        log::debug!("timebase {}: {} ns, up to {} samples", timebase, interval_ns, max_samples);
        Ok(Timebase { interval_ns, max_samples })
    }

    pub fn stop(&mut self) -> Result<()> {
        let handle = self.require("stop", &[State::Streaming, State::Configured])?;
        let status = self.driver.stop(handle);
        self.diag(log::Level::Trace, format_args!("ps4000aStop() = {}", status::name(status)));
        status::check("ps4000aStop", status)?;
        if self.state == State::Streaming {
            log::info!("stopped streaming after {} samples, {} overflow(s)",
                       self.samples_received, self.overflow_count);
        }
        self.state = State::Configured;
        Ok(())
    }

    /// Releases the handle whatever the driver answers. Every later operation fails with
    /// `Error::StaleHandle`.
    pub fn close(&mut self) -> Result<()> {
        let handle = self.handle.take().ok_or(Error::StaleHandle)?;
        let status = self.driver.close_unit(handle);
        self.state = State::Closed;
        self.buffers = Default::default();
        self.channels = [None; 8];
        self.enabled = ChannelSet::empty();
        log::info!("closed oscilloscope, handle {}", handle);
        status::check("ps4000aCloseUnit", status)
    }
}

impl<D: Driver> Drop for Session<D> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(error) = self.close() {
                log::error!("failed to close oscilloscope: {}", error);
            }
        }
    }
}
