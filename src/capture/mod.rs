//! # Capture Module
//!
//! Logs received frames to JSONL files with rotation.
//!
//! This module handles:
//! - Rendering a received frame as a [`FrameRecord`]
//! - Writing records to rotating files (max N records per file)
//! - Retaining only the last M files

pub mod writer;
pub mod record;

pub use writer::CaptureLog;
pub use record::FrameRecord;
