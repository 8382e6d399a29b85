//! # Frame Record
//!
//! One received frame rendered as a JSON line.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::packet::protocol::hex;
use crate::packet::{resolve, Flag, Frame, Packet, PacketType};

/// Capture entry for one received frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    /// RFC 3339 UTC receive time
    pub timestamp: String,
    /// `None` for reserved type tags
    pub kind: Option<PacketType>,
    pub header: u8,
    pub response_requested: bool,
    pub fragmented: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<u8>,
    /// Command parameter, Ack response or Notice text (lossy UTF-8)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Data payload as hex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_hex: Option<String>,
    pub wire_length: usize,
}

impl FrameRecord {
    /// Record `frame` as received now
    pub fn from_frame(frame: &Frame) -> Self {
        Self::at(frame, Utc::now())
    }

    /// Record `frame` as received at `received_at`
    pub fn at(frame: &Frame, received_at: DateTime<Utc>) -> Self {
        let mut record = Self {
            timestamp: received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            kind: None,
            header: frame.header(),
            response_requested: frame.flag(Flag::ResponseRequested),
            fragmented: frame.flag(Flag::Fragmented),
            command: None,
            text: None,
            data_hex: None,
            wire_length: frame.wire_length(),
        };

        let Ok(packet) = resolve(frame) else {
            return record;
        };

        record.kind = Some(packet.packet_type());
        match packet {
            Packet::Data(data) => record.data_hex = Some(hex(data.data())),
            Packet::Command(command) => {
                record.command = Some(command.command());
                record.text = Some(lossy(command.command_param()));
            }
            Packet::Ack(ack) => {
                record.command = Some(ack.command());
                record.text = Some(lossy(ack.response()));
            }
            Packet::Notice(notice) => record.text = Some(lossy(notice.notice())),
        }
        record
    }

    /// Render as one JSON line without the trailing newline
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
