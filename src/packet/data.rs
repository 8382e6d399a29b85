//! # Data Packet
//!
//! Binary payload occupying the whole body. No terminator; the length comes
//! from the frame (on receive, from the radio's reported size).

use super::frame::Frame;
use super::protocol::*;
use crate::error::{LinkError, Result};

/// Read view of a Data frame
#[derive(Debug, Clone, Copy)]
pub struct Data<'a> {
    frame: &'a Frame,
}

impl<'a> Data<'a> {
    pub(crate) fn new(frame: &'a Frame) -> Self {
        Self { frame }
    }

    /// Payload bytes
    pub fn data(&self) -> &'a [u8] {
        self.frame.used_body()
    }

    /// Payload length
    pub fn data_size(&self) -> usize {
        self.frame.len()
    }

    /// Whether the sender marked the payload as fragmented
    pub fn is_fragmented(&self) -> bool {
        self.frame.flag(Flag::Fragmented)
    }
}

/// Write view of a Data frame
#[derive(Debug)]
pub struct DataMut<'a> {
    frame: &'a mut Frame,
}

impl<'a> DataMut<'a> {
    /// Clear `frame` and stamp it as Data
    pub fn initialize(frame: &'a mut Frame) -> Self {
        frame.initialize();
        frame.set_packet_type(PacketType::Data);
        Self { frame }
    }

    pub(crate) fn new(frame: &'a mut Frame) -> Self {
        Self { frame }
    }

    /// Read-only view of the same frame
    pub fn as_view(&self) -> Data<'_> {
        Data::new(self.frame)
    }

    /// Copy up to `DATA_MAX_SIZE` bytes verbatim
    ///
    /// Returns the number of bytes stored; smaller than `from.len()` when truncated.
    pub fn set_data(&mut self, from: &[u8]) -> usize {
        let size = from.len().min(DATA_MAX_SIZE);
        self.frame.body_mut()[..size].copy_from_slice(&from[..size]);
        self.frame.set_used_length(size);
        size
    }

    /// Set or clear the fragmented flag
    pub fn set_fragmented(&mut self, fragmented: bool) {
        self.frame.set_flag(Flag::Fragmented, fragmented);
    }

    /// Whole body for in-place fills; follow with [`DataMut::reset_data_size`]
    pub fn data_array(&mut self) -> &mut [u8] {
        self.frame.body_mut()
    }

    /// Record how many bytes of [`DataMut::data_array`] are in use
    ///
    /// # Errors
    ///
    /// Returns `LengthOutOfRange` if `size > DATA_MAX_SIZE`
    pub fn reset_data_size(&mut self, size: usize) -> Result<()> {
        if size > DATA_MAX_SIZE {
            return Err(LinkError::LengthOutOfRange {
                length: size,
                capacity: DATA_MAX_SIZE,
            });
        }
        self.frame.reset_length(size)
    }
}
