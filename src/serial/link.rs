//! # Modem Link Envelope
//!
//! Request/reply framing between the host and the radio modem.
//!
//! ```text
//! [0xC8][len][opcode][payload...][crc8]
//! len = opcode(1) + payload(N) + crc(1)
//! crc = CRC-8/DVB-S2 over len, opcode and payload
//! ```
//!
//! Every request payload starts with a sequence byte. Replies echo the
//! request opcode with bit 7 set, then the sequence byte, then the radio
//! status (0 = success). The per-opcode layouts below follow those prefixes.

use bytes::{Buf, BytesMut};
use tracing::warn;

use super::crc::crc8_dvb_s2;
use crate::error::{LinkError, Result};

/// First byte of every envelope
pub const SYNC_BYTE: u8 = 0xC8;

/// Opcode bit marking a modem reply
pub const REPLY_FLAG: u8 = 0x80;

/// Largest payload whose `len` byte still fits in a u8
pub const MAX_PAYLOAD: usize = u8::MAX as usize - 2;

/// Sync + len + opcode + crc
const MIN_ENVELOPE: usize = 4;

/// Requests understood by the modem firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Init = 0x01,
    /// `[channel, pan_lo, pan_hi, rate_kbps, power_mw]`
    Begin = 0x02,
    Close = 0x03,
    RxEnable = 0x04,
    RxDisable = 0x05,
    /// `[pan_lo, pan_hi, dst_lo, dst_hi, frame...]`
    Send = 0x06,
    /// `[max_len]`, reply `[status, bytes...]`
    Read = 0x07,
    /// reply `[status, addr_type, tx_retry]`
    GetSendMode = 0x08,
    /// `[addr_type, tx_retry]`
    SetSendMode = 0x09,
    SetAckReq = 0x0A,
    SetBroadcast = 0x0B,
    SetPromiscuous = 0x0C,
    /// reply `[status, addr_lo, addr_hi]`
    MyAddress = 0x0D,
}

impl Opcode {
    /// Opcode the matching reply carries
    pub fn reply(self) -> u8 {
        self as u8 | REPLY_FLAG
    }

    /// Radio operation name used in errors and logs
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Init => "init",
            Opcode::Begin => "begin",
            Opcode::Close => "close",
            Opcode::RxEnable => "rx_enable",
            Opcode::RxDisable => "rx_disable",
            Opcode::Send => "send",
            Opcode::Read => "read_data",
            Opcode::GetSendMode => "send_mode",
            Opcode::SetSendMode => "set_send_mode",
            Opcode::SetAckReq => "set_ack_req",
            Opcode::SetBroadcast => "set_broadcast_enabled",
            Opcode::SetPromiscuous => "set_promiscuous",
            Opcode::MyAddress => "my_address",
        }
    }
}

/// One decoded envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

/// Build a complete envelope for `opcode` and `payload`
///
/// # Errors
///
/// Returns `ModemLink` when the payload does not fit one envelope
pub fn encode(opcode: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD {
        return Err(LinkError::ModemLink(format!(
            "Payload too long: {} bytes, maximum {}",
            payload.len(),
            MAX_PAYLOAD
        )));
    }

    let mut envelope = Vec::with_capacity(MIN_ENVELOPE + payload.len());
    envelope.push(SYNC_BYTE);
    envelope.push((payload.len() + 2) as u8);
    envelope.push(opcode);
    envelope.extend_from_slice(payload);
    envelope.push(crc8_dvb_s2(&envelope[1..]));
    Ok(envelope)
}

/// Take the next valid envelope out of `buf`
///
/// Bytes before a sync byte, envelopes with an impossible length and
/// envelopes failing the CRC are dropped. Returns `None` when `buf` holds no
/// complete envelope yet; a partial envelope stays buffered.
pub fn decode(buf: &mut BytesMut) -> Option<Envelope> {
    loop {
        match buf.iter().position(|&b| b == SYNC_BYTE) {
            Some(0) => {}
            Some(skip) => {
                warn!("Skipping {} bytes before sync", skip);
                buf.advance(skip);
            }
            None => {
                if !buf.is_empty() {
                    warn!("Skipping {} bytes without sync", buf.len());
                    buf.clear();
                }
                return None;
            }
        }

        if buf.len() < 2 {
            return None;
        }

        let length = buf[1] as usize;
        if length < 2 {
            warn!("Invalid envelope length {}", length);
            buf.advance(1);
            continue;
        }

        if buf.len() < 2 + length {
            return None;
        }

        let expected = crc8_dvb_s2(&buf[1..1 + length]);
        let received = buf[1 + length];
        if expected != received {
            warn!("Envelope CRC mismatch: expected 0x{:02X}, got 0x{:02X}", expected, received);
            buf.advance(1);
            continue;
        }

        let envelope = buf.split_to(2 + length);
        return Some(Envelope {
            opcode: envelope[2],
            payload: envelope[3..1 + length].to_vec(),
        });
    }
}
