//! # Packet Module
//!
//! Single-frame packet protocol for the sub-GHz radio link.
//!
//! This module handles:
//! - Frame buffer with a 1-byte header (type tag + fragmented/response-requested flags)
//! - Data, Command, Ack and Notice body codecs with silent truncation
//! - Dispatch from a received header tag to the matching variant view

pub mod protocol;
pub mod frame;
pub mod data;
pub mod command;
pub mod ack;
pub mod notice;
pub mod dispatch;

pub use ack::{Ack, AckMut};
pub use command::{Command, CommandMut};
pub use data::{Data, DataMut};
pub use dispatch::{resolve, resolve_mut, Packet, PacketMut};
pub use frame::Frame;
pub use notice::{Notice, NoticeMut};
pub use protocol::{Flag, PacketType};
