//! # Notice Packet
//!
//! Free text using the whole body, no prefix byte.

use std::str::Utf8Error;

use super::frame::Frame;
use super::protocol::*;

/// Read view of a Notice frame
#[derive(Debug, Clone, Copy)]
pub struct Notice<'a> {
    frame: &'a Frame,
}

impl<'a> Notice<'a> {
    pub(crate) fn new(frame: &'a Frame) -> Self {
        Self { frame }
    }

    /// Notice bytes, up to the terminator or the end of the used body
    pub fn notice(&self) -> &'a [u8] {
        let text = self.frame.used_body();
        &text[..terminated_len(text)]
    }

    /// Notice as UTF-8 text
    pub fn notice_str(&self) -> Result<&'a str, Utf8Error> {
        std::str::from_utf8(self.notice())
    }

    /// Notice length in bytes, without the terminator
    pub fn notice_length(&self) -> usize {
        self.notice().len()
    }
}

/// Write view of a Notice frame
#[derive(Debug)]
pub struct NoticeMut<'a> {
    frame: &'a mut Frame,
}

impl<'a> NoticeMut<'a> {
    /// Clear `frame` and stamp it as Notice
    pub fn initialize(frame: &'a mut Frame) -> Self {
        frame.initialize();
        frame.set_packet_type(PacketType::Notice);
        Self { frame }
    }

    pub(crate) fn new(frame: &'a mut Frame) -> Self {
        Self { frame }
    }

    /// Read-only view of the same frame
    pub fn as_view(&self) -> Notice<'_> {
        Notice::new(self.frame)
    }

    /// Store the notice, truncated to `NOTICE_MAX_LEN` bytes
    ///
    /// Returns the stored length; compare with the input length to detect truncation.
    pub fn set_notice(&mut self, notice: impl AsRef<[u8]>) -> usize {
        let length = write_terminated(self.frame.text_area_mut(), notice.as_ref(), NOTICE_MAX_LEN);
        self.frame.set_used_length(length);
        length
    }
}
