//! # Packet Dispatch
//!
//! Resolves a frame's type tag to the matching variant view. Reserved tags
//! surface as `UnknownPacketType`; there is no default variant.

use super::ack::{Ack, AckMut};
use super::command::{Command, CommandMut};
use super::data::{Data, DataMut};
use super::frame::Frame;
use super::notice::{Notice, NoticeMut};
use super::protocol::PacketType;
use crate::error::Result;

/// Read view of a frame, selected by its type tag
#[derive(Debug, Clone, Copy)]
pub enum Packet<'a> {
    Data(Data<'a>),
    Command(Command<'a>),
    Ack(Ack<'a>),
    Notice(Notice<'a>),
}

impl Packet<'_> {
    /// Type tag this view was resolved from
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Data(_) => PacketType::Data,
            Packet::Command(_) => PacketType::Command,
            Packet::Ack(_) => PacketType::Ack,
            Packet::Notice(_) => PacketType::Notice,
        }
    }
}

/// Write view of a frame, selected by its type tag
#[derive(Debug)]
pub enum PacketMut<'a> {
    Data(DataMut<'a>),
    Command(CommandMut<'a>),
    Ack(AckMut<'a>),
    Notice(NoticeMut<'a>),
}

/// Resolve the read view for `frame`
///
/// # Errors
///
/// Returns `UnknownPacketType` when the tag is 4-7
///
/// # Examples
///
/// ```
/// use subghz_link::packet::{resolve, Frame, Packet};
///
/// let frame = Frame::from_wire_bytes(b"\x03hello").unwrap();
/// match resolve(&frame).unwrap() {
///     Packet::Notice(notice) => assert_eq!(notice.notice(), b"hello"),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn resolve(frame: &Frame) -> Result<Packet<'_>> {
    let packet = match frame.packet_type()? {
        PacketType::Data => Packet::Data(Data::new(frame)),
        PacketType::Command => Packet::Command(Command::new(frame)),
        PacketType::Ack => Packet::Ack(Ack::new(frame)),
        PacketType::Notice => Packet::Notice(Notice::new(frame)),
    };
    Ok(packet)
}

/// Resolve the write view for `frame` without clearing it
///
/// # Errors
///
/// Returns `UnknownPacketType` when the tag is 4-7
pub fn resolve_mut(frame: &mut Frame) -> Result<PacketMut<'_>> {
    let packet = match frame.packet_type()? {
        PacketType::Data => PacketMut::Data(DataMut::new(frame)),
        PacketType::Command => PacketMut::Command(CommandMut::new(frame)),
        PacketType::Ack => PacketMut::Ack(AckMut::new(frame)),
        PacketType::Notice => PacketMut::Notice(NoticeMut::new(frame)),
    };
    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;

    #[test]
    fn test_resolve_each_type() {
        let cases: [(&[u8], PacketType); 4] = [
            (b"\x00\x01\x02", PacketType::Data),
            (b"\x01\x10go", PacketType::Command),
            (b"\x02\x10ok", PacketType::Ack),
            (b"\x03hi", PacketType::Notice),
        ];

        for (wire, expected) in cases {
            let frame = Frame::from_wire_bytes(wire).unwrap();
            assert_eq!(resolve(&frame).unwrap().packet_type(), expected);
        }
    }

    #[test]
    fn test_resolve_unknown_tag() {
        let frame = Frame::from_wire_bytes(&[0x05, 0xAA]).unwrap();
        match resolve(&frame) {
            Err(LinkError::UnknownPacketType(tag)) => assert_eq!(tag, 5),
            other => panic!("Expected UnknownPacketType, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_mut_unknown_tag() {
        let mut frame = Frame::from_wire_bytes(&[0x17]).unwrap();
        assert!(matches!(resolve_mut(&mut frame), Err(LinkError::UnknownPacketType(7))));
    }

    #[test]
    fn test_resolve_ignores_flags() {
        let frame = Frame::from_wire_bytes(b"\x19\x10go").unwrap();
        match resolve(&frame).unwrap() {
            Packet::Command(command) => {
                assert!(command.is_response_requested());
                assert_eq!(command.command(), 0x10);
                assert_eq!(command.command_param(), b"go");
            }
            other => panic!("Expected Command, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_data_keeps_fragmented_flag() {
        let frame = Frame::from_wire_bytes(&[0x10, 1, 2, 3]).unwrap();
        match resolve(&frame).unwrap() {
            Packet::Data(data) => {
                assert!(data.is_fragmented());
                assert_eq!(data.data(), &[1, 2, 3]);
            }
            other => panic!("Expected Data, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_mut_edits_in_place() {
        let mut frame = Frame::from_wire_bytes(b"\x01\x10go").unwrap();
        match resolve_mut(&mut frame).unwrap() {
            PacketMut::Command(mut command) => command.enable_ack_request(),
            other => panic!("Expected Command, got {:?}", other),
        }
        assert_eq!(frame.wire_bytes(), b"\x09\x10go");
    }
}
