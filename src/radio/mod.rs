//! # Radio Module
//!
//! Interface to the sub-GHz transceiver the packet layer sends through.
//!
//! This module handles:
//! - The [`Radio`] trait: lifecycle, transmit/receive and send-mode configuration
//! - Rate, power and send-mode types shared with configuration
//! - A serial modem backend lives in [`crate::serial`]
//!
//! Every call is fallible; implementations report radio status codes through
//! `LinkError::Radio` and callers propagate them unchanged.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// Over-the-air data rate, configured in kbps (50 or 100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u16")]
pub enum DataRate {
    Kbps50,
    Kbps100,
}

impl DataRate {
    /// Rate in kbps
    pub fn kbps(self) -> u16 {
        match self {
            DataRate::Kbps50 => 50,
            DataRate::Kbps100 => 100,
        }
    }
}

impl TryFrom<u16> for DataRate {
    type Error = String;

    fn try_from(kbps: u16) -> std::result::Result<Self, Self::Error> {
        match kbps {
            50 => Ok(DataRate::Kbps50),
            100 => Ok(DataRate::Kbps100),
            other => Err(format!("data rate must be 50 or 100 kbps, got {}", other)),
        }
    }
}

/// Transmit power, configured in mW (1 or 20)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum TxPower {
    Mw1,
    Mw20,
}

impl TxPower {
    /// Power in mW
    pub fn mw(self) -> u8 {
        match self {
            TxPower::Mw1 => 1,
            TxPower::Mw20 => 20,
        }
    }
}

impl TryFrom<u8> for TxPower {
    type Error = String;

    fn try_from(mw: u8) -> std::result::Result<Self, Self::Error> {
        match mw {
            1 => Ok(TxPower::Mw1),
            20 => Ok(TxPower::Mw20),
            other => Err(format!("tx power must be 1 or 20 mW, got {}", other)),
        }
    }
}

/// Radio send parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendMode {
    /// Address type used for outgoing MAC headers
    pub addr_type: u8,
    /// MAC-level transmit retries
    pub tx_retry: u8,
}

/// Sub-GHz transceiver operations
///
/// `read_data` mirrors the transceiver's receive primitive: a positive value
/// is the number of bytes written into `buf`, zero or negative means nothing
/// was received.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Radio: Send {
    /// Power up and reset the transceiver
    async fn init(&mut self) -> Result<()>;

    /// Join a channel and PAN
    async fn begin(&mut self, channel: u8, pan_id: u16, rate: DataRate, power: TxPower) -> Result<()>;

    /// Shut the transceiver down
    async fn close(&mut self) -> Result<()>;

    async fn rx_enable(&mut self) -> Result<()>;

    async fn rx_disable(&mut self) -> Result<()>;

    /// Transmit one frame to `dst_addr`
    async fn send(&mut self, pan_id: u16, dst_addr: u16, bytes: &[u8]) -> Result<()>;

    /// Copy one received frame into `buf`
    async fn read_data(&mut self, buf: &mut [u8]) -> Result<isize>;

    async fn send_mode(&mut self) -> Result<SendMode>;

    async fn set_send_mode(&mut self, mode: SendMode) -> Result<()>;

    /// Request MAC-level acknowledgements for unicast sends
    async fn set_ack_req(&mut self, on: bool) -> Result<()>;

    /// Accept broadcast frames
    async fn set_broadcast_enabled(&mut self, on: bool) -> Result<()>;

    /// Accept frames for any address
    async fn set_promiscuous(&mut self, on: bool) -> Result<()>;

    /// Own short address
    async fn my_address(&mut self) -> Result<u16>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_rate_kbps() {
        assert_eq!(DataRate::try_from(50u16), Ok(DataRate::Kbps50));
        assert_eq!(DataRate::try_from(100u16), Ok(DataRate::Kbps100));
        assert!(DataRate::try_from(200u16).is_err());
        assert_eq!(DataRate::Kbps100.kbps(), 100);
    }

    #[test]
    fn test_tx_power_mw() {
        assert_eq!(TxPower::try_from(1u8), Ok(TxPower::Mw1));
        assert_eq!(TxPower::try_from(20u8), Ok(TxPower::Mw20));
        assert!(TxPower::try_from(10u8).is_err());
        assert_eq!(TxPower::Mw20.mw(), 20);
    }

    #[tokio::test]
    async fn test_fake_radio_replays_incoming() {
        let mut radio = mocks::FakeRadio::new();
        radio.push_incoming(&[0x03, b'a']);
        radio.idle_read = -1;

        let mut buf = [0u8; 8];
        assert_eq!(radio.read_data(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], &[0x03, b'a']);
        assert_eq!(radio.read_data(&mut buf).await.unwrap(), -1);
    }
}
