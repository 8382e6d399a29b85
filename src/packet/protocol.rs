//! # Packet Protocol Constants and Types
//!
//! Frame geometry, header bit layout and the packet type tag.
//!
//! ```text
//! byte 0:     header = (type & 0b111) | (response_requested << 3) | (fragmented << 4)
//! bytes 1..N: body, interpreted per packet type
//! ```

use serde::Serialize;

use crate::error::{LinkError, Result};

/// Bytes available to one radio transmission (250-byte PHY frame minus 11 bytes of MAC overhead)
pub const PAYLOAD_SIZE: usize = 250 - 11;

/// Header size (type tag + flags)
pub const HEADER_SIZE: usize = 1;

/// Body capacity shared by all packet types
pub const BODY_SIZE: usize = PAYLOAD_SIZE - HEADER_SIZE;

/// Header bits holding the packet type
pub const TYPE_MASK: u8 = 0x07;

/// Header bit: sender expects an Ack in reply
pub const FLAG_RESPONSE_REQUESTED: u8 = 0x08;

/// Header bit: payload did not fit in a single frame
pub const FLAG_FRAGMENTED: u8 = 0x10;

/// Size of the command code that prefixes Command and Ack bodies
pub const COMMAND_CODE_SIZE: usize = 1;

/// Maximum Data payload
pub const DATA_MAX_SIZE: usize = BODY_SIZE;

/// Maximum Command parameter length (excluding terminator)
pub const COMMAND_PARAM_MAX_LEN: usize = BODY_SIZE - COMMAND_CODE_SIZE;

/// Maximum Ack response length (excluding terminator)
pub const ACK_RESPONSE_MAX_LEN: usize = BODY_SIZE - COMMAND_CODE_SIZE;

/// Maximum Notice length (excluding terminator)
pub const NOTICE_MAX_LEN: usize = BODY_SIZE;

/// Logical packet kinds carried in the header type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PacketType {
    /// Raw binary payload
    Data = 0,
    /// Command code plus text parameter
    Command = 1,
    /// Reply to a command: command code plus response text
    Ack = 2,
    /// Free text
    Notice = 3,
}

impl PacketType {
    /// Header tag value
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PacketType {
    type Error = LinkError;

    /// Decode a tag, ignoring any bits above the type mask
    fn try_from(value: u8) -> Result<Self> {
        match value & TYPE_MASK {
            0 => Ok(PacketType::Data),
            1 => Ok(PacketType::Command),
            2 => Ok(PacketType::Ack),
            3 => Ok(PacketType::Notice),
            tag => Err(LinkError::UnknownPacketType(tag)),
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PacketType::Data => "data",
            PacketType::Command => "command",
            PacketType::Ack => "ack",
            PacketType::Notice => "notice",
        };
        f.write_str(name)
    }
}

/// Header flag bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Sender wants an Ack frame back (advisory)
    ResponseRequested,
    /// Payload exceeded a single frame
    Fragmented,
}

impl Flag {
    /// Header bit mask for this flag
    pub const fn mask(self) -> u8 {
        match self {
            Flag::ResponseRequested => FLAG_RESPONSE_REQUESTED,
            Flag::Fragmented => FLAG_FRAGMENTED,
        }
    }
}

/// Length of `text` up to (not including) its first NUL byte
pub(crate) fn terminated_len(text: &[u8]) -> usize {
    text.iter().position(|&b| b == 0).unwrap_or(text.len())
}

/// Copy at most `max` bytes of `text` into `dst` and NUL-terminate.
///
/// `text` ends at its first NUL. `dst` must hold at least `max + 1` bytes.
/// Returns the number of text bytes written (excluding the terminator).
pub(crate) fn write_terminated(dst: &mut [u8], text: &[u8], max: usize) -> usize {
    debug_assert!(dst.len() > max);

    let length = terminated_len(text).min(max);
    dst[..length].copy_from_slice(&text[..length]);
    dst[length] = 0;
    length
}

/// Lowercase hex without separators, as logged and captured
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[]), "");
        assert_eq!(hex(&[0x0A, 0xDE, 0xAD, 0x00]), "0adead00");
    }

    #[test]
    fn test_frame_geometry() {
        assert_eq!(PAYLOAD_SIZE, 239);
        assert_eq!(BODY_SIZE, 238);
        assert_eq!(DATA_MAX_SIZE, 238);
        assert_eq!(COMMAND_PARAM_MAX_LEN, 237);
        assert_eq!(ACK_RESPONSE_MAX_LEN, 237);
        assert_eq!(NOTICE_MAX_LEN, 238);
    }

    #[test]
    fn test_header_masks_do_not_overlap() {
        assert_eq!(TYPE_MASK & FLAG_RESPONSE_REQUESTED, 0);
        assert_eq!(TYPE_MASK & FLAG_FRAGMENTED, 0);
        assert_eq!(FLAG_RESPONSE_REQUESTED & FLAG_FRAGMENTED, 0);
    }

    #[test]
    fn test_packet_type_tags() {
        for packet_type in [PacketType::Data, PacketType::Command, PacketType::Ack, PacketType::Notice] {
            assert_eq!(PacketType::try_from(packet_type.tag()).unwrap(), packet_type);
        }
    }

    #[test]
    fn test_reserved_tags_are_unknown() {
        for tag in 4..=7u8 {
            match PacketType::try_from(tag) {
                Err(LinkError::UnknownPacketType(t)) => assert_eq!(t, tag),
                other => panic!("Expected UnknownPacketType for {}, got {:?}", tag, other),
            }
        }
    }

    #[test]
    fn test_try_from_ignores_flag_bits() {
        let header = PacketType::Ack.tag() | FLAG_FRAGMENTED | FLAG_RESPONSE_REQUESTED;
        assert_eq!(PacketType::try_from(header).unwrap(), PacketType::Ack);
    }

    #[test]
    fn test_write_terminated_truncates() {
        let mut dst = [0xFFu8; 5];
        let written = write_terminated(&mut dst, b"abcdef", 4);
        assert_eq!(written, 4);
        assert_eq!(&dst, b"abcd\0");
    }

    #[test]
    fn test_write_terminated_stops_at_nul() {
        let mut dst = [0xFFu8; 8];
        let written = write_terminated(&mut dst, b"ab\0cd", 7);
        assert_eq!(written, 2);
        assert_eq!(&dst[..3], b"ab\0");
    }

    #[test]
    fn test_terminated_len() {
        assert_eq!(terminated_len(b""), 0);
        assert_eq!(terminated_len(b"abc"), 3);
        assert_eq!(terminated_len(b"a\0c"), 1);
    }
}
