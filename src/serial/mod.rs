//! # Serial Modem Module
//!
//! [`Radio`] backend for a sub-GHz modem attached over USB serial.
//!
//! This module handles:
//! - Opening the modem's serial port at the configured baud rate
//! - One request/reply exchange per radio operation ([`link`] envelopes)
//! - Sequence numbers so a reply that missed its deadline is never taken for a later one
//! - Resynchronizing over garbage and CRC failures on the receive side
//! - Reply timeouts and mapping modem status bytes to `LinkError::Radio`

pub mod crc;
pub mod link;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{LinkError, Result};
use crate::radio::{DataRate, Radio, SendMode, TxPower};
use link::{Envelope, Opcode};

/// Modem device paths tried after the configured one
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC modems
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Radio reached through a serial modem
pub struct SerialRadio<P = tokio_serial::SerialStream> {
    port: P,
    device_path: String,
    rx_buf: BytesMut,
    timeout_ms: u64,
    sequence: u8,
}

impl<P> std::fmt::Debug for SerialRadio<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialRadio")
            .field("device_path", &self.device_path)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl SerialRadio<tokio_serial::SerialStream> {
    /// Open the modem described by `config`
    ///
    /// Tries the configured port first, then the common USB device paths.
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` if no candidate could be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use subghz_link::config::SerialConfig;
    /// use subghz_link::serial::SerialRadio;
    ///
    /// let radio = SerialRadio::open(&SerialConfig::default())?;
    /// println!("Modem at {}", radio.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let mut paths = vec![config.port.as_str()];
        paths.extend(DEFAULT_DEVICE_PATHS.iter().filter(|&&p| p != config.port));
        Self::open_with_paths(&paths, config.baud_rate, config.timeout_ms)
    }

    /// Open the first of `paths` that succeeds
    pub fn open_with_paths(paths: &[&str], baud_rate: u32, timeout_ms: u64) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened modem at {} ({} baud)", path, baud_rate);
                    return Ok(Self::from_port(port, *path, timeout_ms));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(LinkError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open one port as 8N1 without flow control
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| LinkError::Serial(format!("Failed to open {}: {}", path, e)))
    }
}

impl<P> SerialRadio<P>
where
    P: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already open byte stream
    pub fn from_port(port: P, device_path: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            port,
            device_path: device_path.into(),
            rx_buf: BytesMut::with_capacity(512),
            timeout_ms,
            sequence: 0,
        }
    }

    /// Path the port was opened from
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Send one request and wait for its reply
    ///
    /// The request payload is prefixed with a fresh sequence byte; only a
    /// reply echoing it is accepted. Returns the reply payload after the
    /// sequence and status bytes.
    async fn request(&mut self, opcode: Opcode, payload: &[u8]) -> Result<Vec<u8>> {
        let operation = opcode.name();
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        let mut body = Vec::with_capacity(1 + payload.len());
        body.push(sequence);
        body.extend_from_slice(payload);
        let envelope = link::encode(opcode as u8, &body)?;

        self.port
            .write_all(&envelope)
            .await
            .map_err(|e| LinkError::Serial(format!("Failed to write {} request: {}", operation, e)))?;
        self.port
            .flush()
            .await
            .map_err(|e| LinkError::Serial(format!("Failed to flush serial port: {}", e)))?;

        let timeout_ms = self.timeout_ms;
        let reply = match timeout(Duration::from_millis(timeout_ms), self.read_reply(opcode, sequence)).await {
            Ok(reply) => reply?,
            Err(_) => return Err(LinkError::Timeout { operation, timeout_ms }),
        };

        match reply.payload.as_slice() {
            [_, 0, rest @ ..] => Ok(rest.to_vec()),
            [_, status, ..] => Err(LinkError::Radio { operation, status: *status }),
            _ => Err(LinkError::ModemLink(format!("Empty {} reply", operation))),
        }
    }

    async fn read_reply(&mut self, opcode: Opcode, sequence: u8) -> Result<Envelope> {
        let expected = opcode.reply();
        loop {
            while let Some(envelope) = link::decode(&mut self.rx_buf) {
                if envelope.opcode != expected {
                    warn!(
                        "Ignoring reply 0x{:02X} while waiting for 0x{:02X}",
                        envelope.opcode, expected
                    );
                    continue;
                }
                match envelope.payload.first() {
                    Some(&echoed) if echoed == sequence => return Ok(envelope),
                    echoed => warn!(
                        "Dropping stale 0x{:02X} reply (sequence {:?}, waiting for {})",
                        envelope.opcode, echoed, sequence
                    ),
                }
            }

            let read = self
                .port
                .read_buf(&mut self.rx_buf)
                .await
                .map_err(|e| LinkError::Serial(format!("Failed to read reply: {}", e)))?;
            if read == 0 {
                return Err(LinkError::Serial("Serial port closed".to_string()));
            }
        }
    }

    async fn request_flag(&mut self, opcode: Opcode, on: bool) -> Result<()> {
        self.request(opcode, &[on as u8]).await.map(|_| ())
    }
}

fn short_reply(operation: &str, expected: usize, got: usize) -> LinkError {
    LinkError::ModemLink(format!(
        "Short {} reply: expected {} bytes, got {}",
        operation, expected, got
    ))
}

#[async_trait]
impl<P> Radio for SerialRadio<P>
where
    P: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn init(&mut self) -> Result<()> {
        self.request(Opcode::Init, &[]).await.map(|_| ())
    }

    async fn begin(&mut self, channel: u8, pan_id: u16, rate: DataRate, power: TxPower) -> Result<()> {
        let [pan_lo, pan_hi] = pan_id.to_le_bytes();
        let payload = [channel, pan_lo, pan_hi, rate.kbps() as u8, power.mw()];
        self.request(Opcode::Begin, &payload).await.map(|_| ())
    }

    async fn close(&mut self) -> Result<()> {
        self.request(Opcode::Close, &[]).await.map(|_| ())
    }

    async fn rx_enable(&mut self) -> Result<()> {
        self.request(Opcode::RxEnable, &[]).await.map(|_| ())
    }

    async fn rx_disable(&mut self) -> Result<()> {
        self.request(Opcode::RxDisable, &[]).await.map(|_| ())
    }

    async fn send(&mut self, pan_id: u16, dst_addr: u16, bytes: &[u8]) -> Result<()> {
        let mut payload = Vec::with_capacity(4 + bytes.len());
        payload.extend_from_slice(&pan_id.to_le_bytes());
        payload.extend_from_slice(&dst_addr.to_le_bytes());
        payload.extend_from_slice(bytes);
        self.request(Opcode::Send, &payload).await.map(|_| ())
    }

    async fn read_data(&mut self, buf: &mut [u8]) -> Result<isize> {
        // Reply carries sequence and status ahead of the frame
        let max_len = buf.len().min(link::MAX_PAYLOAD - 2) as u8;
        let received = self.request(Opcode::Read, &[max_len]).await?;
        if received.len() > buf.len() {
            return Err(LinkError::ModemLink(format!(
                "Read reply of {} bytes exceeds requested {}",
                received.len(),
                buf.len()
            )));
        }

        buf[..received.len()].copy_from_slice(&received);
        Ok(received.len() as isize)
    }

    async fn send_mode(&mut self) -> Result<SendMode> {
        let reply = self.request(Opcode::GetSendMode, &[]).await?;
        match reply.as_slice() {
            [addr_type, tx_retry, ..] => Ok(SendMode {
                addr_type: *addr_type,
                tx_retry: *tx_retry,
            }),
            _ => Err(short_reply("send_mode", 2, reply.len())),
        }
    }

    async fn set_send_mode(&mut self, mode: SendMode) -> Result<()> {
        self.request(Opcode::SetSendMode, &[mode.addr_type, mode.tx_retry])
            .await
            .map(|_| ())
    }

    async fn set_ack_req(&mut self, on: bool) -> Result<()> {
        self.request_flag(Opcode::SetAckReq, on).await
    }

    async fn set_broadcast_enabled(&mut self, on: bool) -> Result<()> {
        self.request_flag(Opcode::SetBroadcast, on).await
    }

    async fn set_promiscuous(&mut self, on: bool) -> Result<()> {
        self.request_flag(Opcode::SetPromiscuous, on).await
    }

    async fn my_address(&mut self) -> Result<u16> {
        let reply = self.request(Opcode::MyAddress, &[]).await?;
        match reply.as_slice() {
            [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
            _ => Err(short_reply("my_address", 2, reply.len())),
        }
    }
}
