//! # Wireless Module
//!
//! Transport facade over a [`Radio`]: builds a frame of one packet kind,
//! hands its wire bytes to the radio and reports how much of the caller's
//! input was stored.
//!
//! The facade owns one reusable [`Frame`] for outgoing packets. Every
//! operation takes `&mut self`, so two sends can never interleave on it;
//! hosts sharing a link across tasks wrap the facade in a mutex, or build a
//! `Frame` per call and use [`Wireless::send`].

use tracing::{debug, info, warn};

use crate::config::RadioConfig;
use crate::error::{LinkError, Result};
use crate::packet::protocol::{hex, DATA_MAX_SIZE, PAYLOAD_SIZE};
use crate::packet::{AckMut, CommandMut, DataMut, Frame, NoticeMut};
use crate::radio::{DataRate, Radio, SendMode, TxPower};

/// Radio lifecycle as seen by the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Uninitialized,
    Initialized,
    /// Joined a channel and PAN
    Active,
    Closed,
}

/// Packet-level transport over a radio
pub struct Wireless<R: Radio> {
    radio: R,
    frame: Frame,
    state: LinkState,
}

fn logged<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        warn!("Radio {} failed: {}", operation, e);
    }
    result
}

impl<R: Radio> Wireless<R> {
    /// Wrap `radio`; nothing is sent until `init`
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            frame: Frame::new(),
            state: LinkState::Uninitialized,
        }
    }

    /// Lifecycle state after the last successful transition
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Borrow the underlying radio
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Mutably borrow the underlying radio
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Give the radio back, dropping the facade
    pub fn into_radio(self) -> R {
        self.radio
    }

    /// Power up the radio
    pub async fn init(&mut self) -> Result<()> {
        logged("init", self.radio.init().await)?;
        self.state = LinkState::Initialized;
        info!("Radio initialized");
        Ok(())
    }

    /// Join `channel` on `pan_id`
    pub async fn begin(&mut self, channel: u8, pan_id: u16, rate: DataRate, power: TxPower) -> Result<()> {
        logged("begin", self.radio.begin(channel, pan_id, rate, power).await)?;
        self.state = LinkState::Active;
        info!(
            "Radio active: channel {}, PAN 0x{:04X}, {} kbps, {} mW",
            channel,
            pan_id,
            rate.kbps(),
            power.mw()
        );
        Ok(())
    }

    /// Close the radio
    pub async fn end(&mut self) -> Result<()> {
        logged("close", self.radio.close().await)?;
        self.state = LinkState::Closed;
        info!("Radio closed");
        Ok(())
    }

    /// Start receiving
    pub async fn enable_rx(&mut self) -> Result<()> {
        logged("rx_enable", self.radio.rx_enable().await)?;
        debug!("RX enabled");
        Ok(())
    }

    /// Stop receiving
    pub async fn disable_rx(&mut self) -> Result<()> {
        logged("rx_disable", self.radio.rx_disable().await)?;
        debug!("RX disabled");
        Ok(())
    }

    /// Bring the radio up from configuration
    ///
    /// Runs init, begin, send mode and the ack/broadcast/promiscuous toggles in
    /// that order, stopping at the first failure.
    pub async fn apply_settings(&mut self, settings: &RadioConfig) -> Result<()> {
        self.init().await?;
        self.begin(settings.channel, settings.pan_id, settings.rate_kbps, settings.tx_power_mw)
            .await?;
        self.set_send_mode(settings.addr_type, settings.tx_retry).await?;
        self.set_ack_req(settings.ack_request).await?;
        self.set_broadcast_enabled(settings.broadcast_enabled).await?;
        self.set_promiscuous(settings.promiscuous).await?;
        Ok(())
    }

    async fn transmit(radio: &mut R, frame: &Frame, pan_id: u16, dst_addr: u16) -> Result<()> {
        let wire = frame.wire_bytes();
        debug!(
            "TX PAN 0x{:04X} -> 0x{:04X} ({} bytes): {}",
            pan_id,
            dst_addr,
            wire.len(),
            hex(wire)
        );
        logged("send", radio.send(pan_id, dst_addr, wire).await)
    }

    /// Send a caller-built frame
    pub async fn send(&mut self, frame: &Frame, pan_id: u16, dst_addr: u16) -> Result<()> {
        Self::transmit(&mut self.radio, frame, pan_id, dst_addr).await
    }

    /// Send a Data packet
    ///
    /// Input longer than one body is truncated and always marked fragmented.
    /// Returns the number of bytes sent.
    pub async fn send_data(&mut self, pan_id: u16, dst_addr: u16, data: &[u8], fragmented: bool) -> Result<usize> {
        let fragmented = fragmented || data.len() > DATA_MAX_SIZE;
        let mut packet = DataMut::initialize(&mut self.frame);
        let written = packet.set_data(data);
        packet.set_fragmented(fragmented);
        Self::transmit(&mut self.radio, &self.frame, pan_id, dst_addr).await?;
        Ok(written)
    }

    async fn command(
        &mut self,
        pan_id: u16,
        dst_addr: u16,
        command: u8,
        param: &[u8],
        response_requested: bool,
    ) -> Result<usize> {
        let mut packet = CommandMut::initialize(&mut self.frame);
        packet.set_command(command);
        let written = packet.set_command_param(param);
        packet.set_response_requested(response_requested);
        Self::transmit(&mut self.radio, &self.frame, pan_id, dst_addr).await?;
        Ok(written)
    }

    /// Send a Command packet; returns the stored parameter length
    pub async fn send_command(&mut self, pan_id: u16, dst_addr: u16, command: u8, param: impl AsRef<[u8]>) -> Result<usize> {
        self.command(pan_id, dst_addr, command, param.as_ref(), false).await
    }

    /// Send a Command packet asking the peer to answer with an Ack
    pub async fn send_command_with_ack(
        &mut self,
        pan_id: u16,
        dst_addr: u16,
        command: u8,
        param: impl AsRef<[u8]>,
    ) -> Result<usize> {
        self.command(pan_id, dst_addr, command, param.as_ref(), true).await
    }

    /// Send an Ack for `command`; returns the stored response length
    pub async fn send_ack(&mut self, pan_id: u16, dst_addr: u16, command: u8, response: impl AsRef<[u8]>) -> Result<usize> {
        let mut packet = AckMut::initialize(&mut self.frame);
        packet.set_command(command);
        let written = packet.set_response(response);
        Self::transmit(&mut self.radio, &self.frame, pan_id, dst_addr).await?;
        Ok(written)
    }

    /// Send a Notice packet; returns the stored text length
    pub async fn send_notice(&mut self, pan_id: u16, dst_addr: u16, notice: impl AsRef<[u8]>) -> Result<usize> {
        let mut packet = NoticeMut::initialize(&mut self.frame);
        let written = packet.set_notice(notice);
        Self::transmit(&mut self.radio, &self.frame, pan_id, dst_addr).await?;
        Ok(written)
    }

    /// Poll the radio for one received frame
    ///
    /// Returns `Ok(None)` when nothing was received; `frame` is only written
    /// when a frame arrives.
    pub async fn listen(&mut self, frame: &mut Frame) -> Result<Option<usize>> {
        let mut scratch = [0u8; PAYLOAD_SIZE];
        let size = logged("read_data", self.radio.read_data(&mut scratch).await)?;
        if size <= 0 {
            return Ok(None);
        }

        let size = size as usize;
        if size > scratch.len() {
            return Err(LinkError::FrameTooLong {
                length: size,
                capacity: scratch.len(),
            });
        }

        frame.load_wire_bytes(&scratch[..size])?;
        debug!("RX ({} bytes): {}", size, hex(&scratch[..size]));
        Ok(Some(size))
    }

    /// Address type from the radio's current send mode
    pub async fn addr_type(&mut self) -> Result<u8> {
        Ok(logged("send_mode", self.radio.send_mode().await)?.addr_type)
    }

    /// Transmit retry count from the radio's current send mode
    pub async fn tx_retry(&mut self) -> Result<u8> {
        Ok(logged("send_mode", self.radio.send_mode().await)?.tx_retry)
    }

    /// The radio's own short address
    pub async fn my_address(&mut self) -> Result<u16> {
        logged("my_address", self.radio.my_address().await)
    }

    /// Toggle MAC-level acknowledgement requests
    pub async fn set_ack_req(&mut self, on: bool) -> Result<()> {
        logged("set_ack_req", self.radio.set_ack_req(on).await)
    }

    /// Toggle reception of broadcast frames
    pub async fn set_broadcast_enabled(&mut self, on: bool) -> Result<()> {
        logged("set_broadcast_enabled", self.radio.set_broadcast_enabled(on).await)
    }

    /// Toggle reception of frames addressed to others
    pub async fn set_promiscuous(&mut self, on: bool) -> Result<()> {
        logged("set_promiscuous", self.radio.set_promiscuous(on).await)
    }

    /// Update both send-mode fields; the current mode is read first
    pub async fn set_send_mode(&mut self, addr_type: u8, tx_retry: u8) -> Result<()> {
        let mut mode: SendMode = logged("send_mode", self.radio.send_mode().await)?;
        mode.addr_type = addr_type;
        mode.tx_retry = tx_retry;
        logged("set_send_mode", self.radio.set_send_mode(mode).await)?;
        debug!("Send mode: addr_type {}, tx_retry {}", addr_type, tx_retry);
        Ok(())
    }
}
