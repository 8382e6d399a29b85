//! # SubGHz Link Library
//!
//! Single-frame packet protocol for 920MHz sub-GHz radio links.
//!
//! This library provides the packet codecs (Data, Command, Ack, Notice), a
//! transport facade over an injectable radio, and a serial modem backend.

pub mod capture;
pub mod config;
pub mod error;
pub mod packet;
pub mod radio;
pub mod serial;
pub mod wireless;
