use core::{ptr, slice};
use std::ops::{Index, Range};

use crate::{Error, Result};
use crate::params::{ChannelSet, RatioMode};

/// Sample storage registered with the driver as a streaming destination.
///
/// The allocation is never moved or resized while it exists, so the pointer handed to
/// the driver stays valid until the buffer is dropped.
#[derive(Debug)]
pub struct ChannelBuffer {
    ptr: *mut i16,
    len: usize,
    mode: RatioMode,
}

// SAFETY: Conceptually the same as `Box<[i16]>`. The destructor can run on any thread.
unsafe impl Send for ChannelBuffer {}

impl ChannelBuffer {
    pub fn new(len: usize, mode: RatioMode) -> ChannelBuffer {
        let ptr = Box::into_raw(vec![0i16; len].into_boxed_slice()) as *mut i16;
        log::trace!("allocated channel buffer at {:?}+{}", ptr, len);
        ChannelBuffer { ptr, len, mode }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn mode(&self) -> RatioMode {
        self.mode
    }

    pub(crate) fn as_mut_ptr(&self) -> *mut i16 {
        self.ptr
    }

    pub fn as_slice(&self) -> &[i16] {
        // SAFETY: `ptr` points to `len` initialized samples owned by `self`. The driver only
        // writes into them while a driver call is in progress, which cannot overlap this
        // borrow since every driver call goes through the owning session by `&mut`.
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Samples in `range`, or a bounds error if the range does not fit the buffer.
    pub fn get(&self, range: Range<usize>) -> Result<&[i16]> {
        if range.start > range.end {
            return Err(self.out_of_bounds(range.start, 0))
        }
        self.window(range.start, range.end - range.start)
    }

    /// `count` samples from `start`, or a bounds error if they do not fit the buffer.
    pub fn window(&self, start: usize, count: usize) -> Result<&[i16]> {
        match start.checked_add(count) {
            Some(end) if end <= self.len => Ok(&self.as_slice()[start..end]),
            _ => Err(self.out_of_bounds(start, count)),
        }
    }

    fn out_of_bounds(&self, start: usize, count: usize) -> Error {
        Error::BufferBounds { start, count, capacity: self.len, overflow: ChannelSet::empty() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }
}

impl Index<Range<usize>> for ChannelBuffer {
    type Output = [i16];

    fn index(&self, index: Range<usize>) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl Drop for ChannelBuffer {
    fn drop(&mut self) {
        // SAFETY: Allocated as a boxed slice of the same length in `Self::new`.
        unsafe {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(self.ptr, self.len)));
        }
        log::trace!("freed channel buffer at {:?}+{}", self.ptr, self.len);
    }
}

/// What a single poll reported. The samples themselves stay in the channel buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamingEvent {
    pub sample_count: usize,
    pub start_index: usize,
    /// Channels which overflowed since the previous poll.
    pub overflow: ChannelSet,
    /// Index of the trigger sample relative to `start_index`, if the device triggered.
    pub trigger_at: Option<usize>,
    pub auto_stop: bool,
}

impl StreamingEvent {
    /// One past the last reported sample, `None` if that is not addressable.
    pub fn end(&self) -> Option<usize> {
        self.start_index.checked_add(self.sample_count)
    }

    pub fn range(&self) -> Range<usize> {
        self.start_index..self.start_index.saturating_add(self.sample_count)
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    pub fn overflowed(&self) -> bool {
        !self.overflow.is_empty()
    }

    pub fn check_overflow(&self) -> Result<()> {
        if self.overflowed() {
            Err(Error::BufferOverflow(self.overflow))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_channel_buffer_zeroed() {
        let buf = ChannelBuffer::new(100, RatioMode::NONE);
        assert_eq!(buf.len(), 100);
        assert!(buf.as_slice().iter().all(|&sample| sample == 0));
        assert_eq!(buf.as_bytes().len(), 200);
    }

    #[test]
    fn test_channel_buffer_bounds() {
        let buf = ChannelBuffer::new(8, RatioMode::NONE);
        assert_eq!(buf.get(2..8).unwrap().len(), 6);
        assert_eq!(&buf[0..2], &[0i16, 0][..]);
        assert!(matches!(buf.get(4..12),
            Err(Error::BufferBounds { start: 4, count: 8, capacity: 8, .. })));
        assert!(matches!(buf.window(usize::MAX - 2, 4),
            Err(Error::BufferBounds { start, count: 4, capacity: 8, .. }) if start == usize::MAX - 2));
        assert!(matches!(buf.get(6..4), Err(Error::BufferBounds { start: 6, count: 0, .. })));
    }

    #[test]
    fn test_channel_buffer_driver_write() {
        let buf = ChannelBuffer::new(4, RatioMode::NONE);
        unsafe { *buf.as_mut_ptr().add(3) = -7 }
        assert_eq!(buf.as_slice(), &[0i16, 0, 0, -7][..]);
    }

    #[test]
    fn test_streaming_event() {
        let event = StreamingEvent { sample_count: 10, start_index: 90, ..Default::default() };
        assert_eq!(event.range(), 90..100);
        assert_eq!(event.end(), Some(100));
        assert!(!event.overflowed());
        assert!(event.check_overflow().is_ok());

        let event = StreamingEvent { overflow: ChannelSet::B, ..event };
        assert!(event.overflowed());
        assert!(matches!(event.check_overflow(),
            Err(Error::BufferOverflow(set)) if set == ChannelSet::B));

        let event = StreamingEvent { start_index: usize::MAX - 5, ..event };
        assert_eq!(event.end(), None);
        assert_eq!(event.range(), usize::MAX - 5..usize::MAX);
    }
}
