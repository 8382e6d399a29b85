//! # Frame Buffer
//!
//! One radio transmission: a header byte followed by a fixed-capacity body.
//!
//! The buffer keeps one extra byte past the body so that a string filling the
//! whole body can still be NUL-terminated in memory. That byte is never sent.

use super::protocol::*;
use crate::error::{LinkError, Result};

/// Header byte plus body plus terminator slot
const BUFFER_SIZE: usize = PAYLOAD_SIZE + 1;

/// A single frame with its used body length
///
/// `len()` counts body bytes only; the header is added by [`Frame::wire_length`].
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; BUFFER_SIZE],
    length: usize,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("header", &format_args!("0x{:02X}", self.header()))
            .field("length", &self.length)
            .field("body", &&self.body()[..self.length])
            .finish()
    }
}

impl Frame {
    /// Create an empty frame (header 0, no body)
    pub fn new() -> Self {
        Self {
            bytes: [0u8; BUFFER_SIZE],
            length: 0,
        }
    }

    /// Wrap bytes received from the radio
    ///
    /// # Errors
    ///
    /// - `FrameTooShort` if `wire` is empty
    /// - `FrameTooLong` if `wire` exceeds `PAYLOAD_SIZE`
    pub fn from_wire_bytes(wire: &[u8]) -> Result<Self> {
        let mut frame = Self::new();
        frame.load_wire_bytes(wire)?;
        Ok(frame)
    }

    /// Reset to the empty state: header and used length zeroed
    pub fn initialize(&mut self) {
        self.bytes = [0u8; BUFFER_SIZE];
        self.length = 0;
    }

    /// Replace the frame contents with bytes received from the radio
    ///
    /// On error the frame is left unchanged.
    pub fn load_wire_bytes(&mut self, wire: &[u8]) -> Result<()> {
        if wire.is_empty() {
            return Err(LinkError::FrameTooShort);
        }
        if wire.len() > PAYLOAD_SIZE {
            return Err(LinkError::FrameTooLong {
                length: wire.len(),
                capacity: PAYLOAD_SIZE,
            });
        }

        self.initialize();
        self.bytes[..wire.len()].copy_from_slice(wire);
        self.length = wire.len() - HEADER_SIZE;
        Ok(())
    }

    /// Raw header byte
    pub fn header(&self) -> u8 {
        self.bytes[0]
    }

    /// Type tag bits (0-7), without validation
    pub fn raw_type(&self) -> u8 {
        self.bytes[0] & TYPE_MASK
    }

    /// Decoded packet type
    ///
    /// # Errors
    ///
    /// Returns `UnknownPacketType` for reserved tags
    pub fn packet_type(&self) -> Result<PacketType> {
        PacketType::try_from(self.raw_type())
    }

    /// Stamp the type tag, leaving flag bits alone
    pub fn set_packet_type(&mut self, packet_type: PacketType) {
        self.bytes[0] = (self.bytes[0] & !TYPE_MASK) | packet_type.tag();
    }

    /// Test a header flag
    pub fn flag(&self, flag: Flag) -> bool {
        self.bytes[0] & flag.mask() != 0
    }

    /// Set or clear a header flag
    pub fn set_flag(&mut self, flag: Flag, on: bool) {
        if on {
            self.bytes[0] |= flag.mask();
        } else {
            self.bytes[0] &= !flag.mask();
        }
    }

    /// Body bytes (full capacity, not just the used part)
    pub fn body(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..HEADER_SIZE + BODY_SIZE]
    }

    /// Mutable body bytes (full capacity)
    pub fn body_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[HEADER_SIZE..HEADER_SIZE + BODY_SIZE]
    }

    /// Used part of the body
    pub fn used_body(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..HEADER_SIZE + self.length]
    }

    /// Body plus terminator slot, for string codecs
    pub(crate) fn text_area_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[HEADER_SIZE..]
    }

    /// Used body length
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether no body bytes are in use
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Record the used body length
    ///
    /// # Errors
    ///
    /// Returns `LengthOutOfRange` if `length > BODY_SIZE`; callers truncate first.
    pub fn reset_length(&mut self, length: usize) -> Result<()> {
        if length > BODY_SIZE {
            return Err(LinkError::LengthOutOfRange {
                length,
                capacity: BODY_SIZE,
            });
        }
        self.length = length;
        Ok(())
    }

    /// Record a length the caller already clamped to the body capacity
    ///
    /// # Panics
    ///
    /// If `length` exceeds `BODY_SIZE`
    pub(crate) fn set_used_length(&mut self, length: usize) {
        assert!(length <= BODY_SIZE, "used length {} exceeds body capacity {}", length, BODY_SIZE);
        self.length = length;
    }

    /// Bytes handed to the radio: header plus used body
    pub fn wire_length(&self) -> usize {
        self.length + HEADER_SIZE
    }

    /// Header plus used body, ready for transmission
    pub fn wire_bytes(&self) -> &[u8] {
        &self.bytes[..self.wire_length()]
    }
}
