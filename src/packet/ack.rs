//! # Ack Packet
//!
//! Reply to a Command: same layout, body[0] echoes the acknowledged command
//! code and body[1..] carries the response text.

use std::str::Utf8Error;

use super::frame::Frame;
use super::protocol::*;

/// Read view of an Ack frame
#[derive(Debug, Clone, Copy)]
pub struct Ack<'a> {
    frame: &'a Frame,
}

impl<'a> Ack<'a> {
    pub(crate) fn new(frame: &'a Frame) -> Self {
        Self { frame }
    }

    /// Command code being acknowledged
    pub fn command(&self) -> u8 {
        self.frame.body()[0]
    }

    /// Response bytes, up to the terminator or the end of the used body
    pub fn response(&self) -> &'a [u8] {
        let response = self.frame.used_body().get(COMMAND_CODE_SIZE..).unwrap_or(&[]);
        &response[..terminated_len(response)]
    }

    /// Response as UTF-8 text
    pub fn response_str(&self) -> Result<&'a str, Utf8Error> {
        std::str::from_utf8(self.response())
    }

    /// Response length in bytes, without the terminator
    pub fn response_length(&self) -> usize {
        self.response().len()
    }
}

/// Write view of an Ack frame
#[derive(Debug)]
pub struct AckMut<'a> {
    frame: &'a mut Frame,
}

impl<'a> AckMut<'a> {
    /// Clear `frame` and stamp it as Ack
    pub fn initialize(frame: &'a mut Frame) -> Self {
        frame.initialize();
        frame.set_packet_type(PacketType::Ack);
        Self { frame }
    }

    pub(crate) fn new(frame: &'a mut Frame) -> Self {
        Self { frame }
    }

    /// Read-only view of the same frame
    pub fn as_view(&self) -> Ack<'_> {
        Ack::new(self.frame)
    }

    /// Store the acknowledged command code
    pub fn set_command(&mut self, command: u8) {
        self.frame.body_mut()[0] = command;
        if self.frame.is_empty() {
            self.frame.set_used_length(COMMAND_CODE_SIZE);
        }
    }

    /// Store the response, truncated to `ACK_RESPONSE_MAX_LEN` bytes
    pub fn set_response(&mut self, response: impl AsRef<[u8]>) -> usize {
        let area = &mut self.frame.text_area_mut()[COMMAND_CODE_SIZE..];
        let length = write_terminated(area, response.as_ref(), ACK_RESPONSE_MAX_LEN);
        self.frame.set_used_length(COMMAND_CODE_SIZE + length);
        length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_layout() {
        let mut frame = Frame::new();
        let mut ack = AckMut::initialize(&mut frame);
        ack.set_command(0x10);
        assert_eq!(ack.set_response("ok"), 2);

        assert_eq!(frame.packet_type().unwrap(), PacketType::Ack);
        assert_eq!(frame.wire_bytes(), b"\x02\x10ok");
        assert_eq!(frame.body()[3], 0);
    }

    #[test]
    fn test_ack_getters() {
        let mut frame = Frame::new();
        let mut ack = AckMut::initialize(&mut frame);
        ack.set_command(0x42);
        ack.set_response("battery=3.1V");

        let view = ack.as_view();
        assert_eq!(view.command(), 0x42);
        assert_eq!(view.response_str().unwrap(), "battery=3.1V");
        assert_eq!(view.response_length(), 12);
    }

    #[test]
    fn test_response_truncation() {
        let response = vec![b'r'; ACK_RESPONSE_MAX_LEN + 1];
        let mut frame = Frame::new();
        let mut ack = AckMut::initialize(&mut frame);
        ack.set_command(1);

        assert_eq!(ack.set_response(&response), ACK_RESPONSE_MAX_LEN);
        assert_eq!(ack.as_view().response_length(), ACK_RESPONSE_MAX_LEN);
        assert_eq!(ack.as_view().command(), 1);
        assert_eq!(frame.wire_length(), PAYLOAD_SIZE);
    }

    #[test]
    fn test_received_ack() {
        let frame = Frame::from_wire_bytes(b"\x02\x07done").unwrap();
        let view = Ack::new(&frame);
        assert_eq!(view.command(), 7);
        assert_eq!(view.response(), b"done");
    }

    #[test]
    fn test_received_ack_with_terminator_on_wire() {
        let frame = Frame::from_wire_bytes(b"\x02\x07done\0junk").unwrap();
        let view = Ack::new(&frame);
        assert_eq!(view.response(), b"done");
        assert_eq!(view.response_length(), 4);
    }

    #[test]
    fn test_rewrite_through_write_view() {
        let mut frame = Frame::from_wire_bytes(b"\x02\x07done").unwrap();
        let mut ack = AckMut::new(&mut frame);
        ack.set_response("retry");
        assert_eq!(frame.wire_bytes(), b"\x02\x07retry");
    }
}
