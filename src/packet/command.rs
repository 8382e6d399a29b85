//! # Command Packet
//!
//! ```text
//! body[0]   command code (opaque to this layer)
//! body[1..] parameter text, NUL-terminated when it fits
//! ```
//!
//! The response-requested header flag asks the receiver for an Ack. Nothing
//! here enforces a reply.

use std::str::Utf8Error;

use super::frame::Frame;
use super::protocol::*;

/// Read view of a Command frame
#[derive(Debug, Clone, Copy)]
pub struct Command<'a> {
    frame: &'a Frame,
}

impl<'a> Command<'a> {
    pub(crate) fn new(frame: &'a Frame) -> Self {
        Self { frame }
    }

    /// Command code
    pub fn command(&self) -> u8 {
        self.frame.body()[0]
    }

    /// Parameter bytes, up to the terminator or the end of the used body
    pub fn command_param(&self) -> &'a [u8] {
        let param = self.frame.used_body().get(COMMAND_CODE_SIZE..).unwrap_or(&[]);
        &param[..terminated_len(param)]
    }

    /// Parameter as UTF-8 text
    pub fn command_param_str(&self) -> Result<&'a str, Utf8Error> {
        std::str::from_utf8(self.command_param())
    }

    /// Parameter length, excluding the terminator
    pub fn command_param_length(&self) -> usize {
        self.command_param().len()
    }

    /// Whether the sender asked for an Ack
    pub fn is_response_requested(&self) -> bool {
        self.frame.flag(Flag::ResponseRequested)
    }
}

/// Write view of a Command frame
#[derive(Debug)]
pub struct CommandMut<'a> {
    frame: &'a mut Frame,
}

impl<'a> CommandMut<'a> {
    /// Clear `frame` and stamp it as Command
    pub fn initialize(frame: &'a mut Frame) -> Self {
        frame.initialize();
        frame.set_packet_type(PacketType::Command);
        Self { frame }
    }

    pub(crate) fn new(frame: &'a mut Frame) -> Self {
        Self { frame }
    }

    /// Read-only view of the same frame
    pub fn as_view(&self) -> Command<'_> {
        Command::new(self.frame)
    }

    /// Store the command code; the code byte always goes on the wire
    pub fn set_command(&mut self, command: u8) {
        self.frame.body_mut()[0] = command;
        if self.frame.is_empty() {
            self.frame.set_used_length(COMMAND_CODE_SIZE);
        }
    }

    /// Store the parameter, truncated to `COMMAND_PARAM_MAX_LEN` bytes
    ///
    /// Returns the stored length; compare with the input length to detect truncation.
    pub fn set_command_param(&mut self, param: impl AsRef<[u8]>) -> usize {
        let area = &mut self.frame.text_area_mut()[COMMAND_CODE_SIZE..];
        let length = write_terminated(area, param.as_ref(), COMMAND_PARAM_MAX_LEN);
        self.frame.set_used_length(COMMAND_CODE_SIZE + length);
        length
    }

    /// Ask the receiver for an Ack
    pub fn enable_ack_request(&mut self) {
        self.set_response_requested(true);
    }

    /// Set or clear the response-requested flag
    pub fn set_response_requested(&mut self, requested: bool) {
        self.frame.set_flag(Flag::ResponseRequested, requested);
    }
}
