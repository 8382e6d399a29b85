//! # SubGHz Link
//!
//! Bridge between a host and a 920MHz sub-GHz radio modem.
//!
//! Listens for packets, logs and optionally captures each one, answers
//! commands that request a response, and sends periodic Notice beacons.

use anyhow::{Context, Result};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use subghz_link::capture::{CaptureLog, FrameRecord};
use subghz_link::config::{Config, LoggingConfig};
use subghz_link::packet::{resolve, Frame, Packet};
use subghz_link::radio::Radio;
use subghz_link::serial::SerialRadio;
use subghz_link::wireless::Wireless;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Log file name prefix inside `[logging] dir`
const LOG_FILE_PREFIX: &str = "subghz-link.log";

/// Received frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 100;

/// Counters reported at shutdown
#[derive(Debug, Default)]
struct LinkStats {
    received: u64,
    acked: u64,
    beacons: u64,
    errors: u64,
}

/// Install the tracing subscriber
///
/// Logs to stdout, plus a daily rolling file when `[logging] dir` is set.
/// The returned guard must live as long as logging is needed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    if config.dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();
    Some(guard)
}

/// Command code to acknowledge, if `frame` is a Command asking for a response
fn pending_ack(frame: &Frame) -> Option<u8> {
    match resolve(frame) {
        Ok(Packet::Command(command)) if command.is_response_requested() => Some(command.command()),
        _ => None,
    }
}

/// Log, capture and answer one received frame
async fn handle_frame<R: Radio>(
    wireless: &mut Wireless<R>,
    frame: &Frame,
    config: &Config,
    capture: Option<&mut CaptureLog>,
    stats: &mut LinkStats,
) {
    let record = FrameRecord::from_frame(frame);
    match &record.kind {
        Some(kind) => info!(
            "RX {} ({} bytes){}",
            kind,
            record.wire_length,
            record.text.as_deref().map(|t| format!(": {}", t)).unwrap_or_default()
        ),
        None => warn!("RX frame with reserved type tag, header 0x{:02X}", record.header),
    }

    if let Some(capture) = capture {
        if let Err(e) = capture.append(&record) {
            warn!("Failed to capture frame: {}", e);
        }
    }

    if !config.link.auto_ack {
        return;
    }

    if let Some(command) = pending_ack(frame) {
        match wireless
            .send_ack(config.radio.pan_id, config.link.dst_addr, command, &config.link.ack_response)
            .await
        {
            Ok(_) => {
                stats.acked += 1;
                debug!("Acknowledged command 0x{:02X}", command);
            }
            Err(e) => {
                stats.errors += 1;
                warn!("Failed to acknowledge command 0x{:02X}: {}", command, e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let loaded = Config::load_optional(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    let from_file = loaded.is_some();
    let config = loaded.unwrap_or_default();

    let _log_guard = init_logging(&config.logging);

    info!("SubGHz Link v{} starting...", env!("CARGO_PKG_VERSION"));
    if from_file {
        info!("Loaded configuration from {}", config_path);
    } else {
        warn!("Config file {} not found, using defaults", config_path);
    }

    let radio = SerialRadio::open(&config.serial).context("Failed to open radio modem")?;
    info!("Modem serial port opened at: {}", radio.device_path());

    let mut wireless = Wireless::new(radio);
    wireless
        .apply_settings(&config.radio)
        .await
        .context("Failed to configure radio")?;
    let address = wireless.my_address().await?;
    info!("Own address 0x{:04X}", address);
    wireless.enable_rx().await?;

    let mut capture = if config.capture.enabled {
        Some(CaptureLog::new(&config.capture)?)
    } else {
        None
    };

    let mut poll = interval(Duration::from_millis(config.link.poll_interval_ms));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let beacon_ms = config.link.beacon_interval_ms;
    let mut beacon = interval(Duration::from_millis(beacon_ms.max(1)));

    info!(
        "Listening on channel {}, PAN 0x{:04X}",
        config.radio.channel, config.radio.pan_id
    );
    info!("Press Ctrl+C to exit");

    let mut rx = Frame::new();
    let mut stats = LinkStats::default();
    let mut last_log_count: u64 = 0;

    loop {
        tokio::select! {
            _ = poll.tick() => {
                match wireless.listen(&mut rx).await {
                    Ok(Some(_)) => {
                        stats.received += 1;
                        handle_frame(&mut wireless, &rx, &config, capture.as_mut(), &mut stats).await;

                        if stats.received - last_log_count >= LOG_INTERVAL_FRAMES {
                            info!("Received {} frames, {} acked", stats.received, stats.acked);
                            last_log_count = stats.received;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        stats.errors += 1;
                        warn!("Receive failed: {}", e);
                    }
                }
            }

            _ = beacon.tick(), if beacon_ms > 0 => {
                match wireless
                    .send_notice(config.radio.pan_id, config.link.dst_addr, &config.link.beacon_text)
                    .await
                {
                    Ok(_) => stats.beacons += 1,
                    Err(e) => {
                        stats.errors += 1;
                        warn!("Failed to send beacon: {}", e);
                    }
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    if let Err(e) = wireless.disable_rx().await {
        warn!("Failed to disable RX: {}", e);
    }
    if let Err(e) = wireless.end().await {
        warn!("Failed to close radio: {}", e);
    }
    if let Some(capture) = capture.as_mut() {
        capture.flush()?;
    }

    info!(
        "Received {} frames, sent {} acks and {} beacons, {} errors",
        stats.received, stats.acked, stats.beacons, stats.errors
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use subghz_link::radio::{DataRate, SendMode, TxPower};

    #[test]
    fn test_pending_ack_for_requested_command() {
        let frame = Frame::from_wire_bytes(b"\x09\x10status").unwrap();
        assert_eq!(pending_ack(&frame), Some(0x10));
    }

    #[test]
    fn test_no_ack_without_request_flag() {
        let frame = Frame::from_wire_bytes(b"\x01\x10status").unwrap();
        assert_eq!(pending_ack(&frame), None);
    }

    #[test]
    fn test_no_ack_for_other_kinds() {
        // Ack, Notice and Data with the flag set, then a reserved tag
        let wires: [&[u8]; 4] = [b"\x0A\x10ok", b"\x0Bhi", b"\x08\x01", b"\x0D"];
        for wire in wires {
            let frame = Frame::from_wire_bytes(wire).unwrap();
            assert_eq!(pending_ack(&frame), None, "header 0x{:02X}", wire[0]);
        }
    }

    /// Radio that records sends and receives nothing
    #[derive(Default)]
    struct RecordingRadio {
        sent: Vec<(u16, u16, Vec<u8>)>,
    }

    #[async_trait::async_trait]
    impl Radio for RecordingRadio {
        async fn init(&mut self) -> subghz_link::error::Result<()> { Ok(()) }
        async fn begin(&mut self, _: u8, _: u16, _: DataRate, _: TxPower) -> subghz_link::error::Result<()> { Ok(()) }
        async fn close(&mut self) -> subghz_link::error::Result<()> { Ok(()) }
        async fn rx_enable(&mut self) -> subghz_link::error::Result<()> { Ok(()) }
        async fn rx_disable(&mut self) -> subghz_link::error::Result<()> { Ok(()) }
        async fn send(&mut self, pan_id: u16, dst_addr: u16, bytes: &[u8]) -> subghz_link::error::Result<()> {
            self.sent.push((pan_id, dst_addr, bytes.to_vec()));
            Ok(())
        }
        async fn read_data(&mut self, _: &mut [u8]) -> subghz_link::error::Result<isize> { Ok(0) }
        async fn send_mode(&mut self) -> subghz_link::error::Result<SendMode> { Ok(SendMode::default()) }
        async fn set_send_mode(&mut self, _: SendMode) -> subghz_link::error::Result<()> { Ok(()) }
        async fn set_ack_req(&mut self, _: bool) -> subghz_link::error::Result<()> { Ok(()) }
        async fn set_broadcast_enabled(&mut self, _: bool) -> subghz_link::error::Result<()> { Ok(()) }
        async fn set_promiscuous(&mut self, _: bool) -> subghz_link::error::Result<()> { Ok(()) }
        async fn my_address(&mut self) -> subghz_link::error::Result<u16> { Ok(0x0001) }
    }

    #[tokio::test]
    async fn test_handle_frame_acknowledges_requested_command() {
        let mut wireless = Wireless::new(RecordingRadio::default());
        let config = Config::default();
        let mut stats = LinkStats::default();
        let frame = Frame::from_wire_bytes(b"\x09\x10status").unwrap();

        handle_frame(&mut wireless, &frame, &config, None, &mut stats).await;

        let sent = &wireless.radio().sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], (0xABCD, 0xFFFF, b"\x02\x10ok".to_vec()));
        assert_eq!(stats.acked, 1);
        assert_eq!(stats.errors, 0);
    }

    #[tokio::test]
    async fn test_handle_frame_without_auto_ack_sends_nothing() {
        let mut wireless = Wireless::new(RecordingRadio::default());
        let mut config = Config::default();
        config.link.auto_ack = false;
        let mut stats = LinkStats::default();
        let frame = Frame::from_wire_bytes(b"\x09\x10status").unwrap();

        handle_frame(&mut wireless, &frame, &config, None, &mut stats).await;

        assert!(wireless.radio().sent.is_empty());
        assert_eq!(stats.acked, 0);
    }

    #[tokio::test]
    async fn test_handle_frame_captures_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.capture.log_dir = temp_dir.path().to_string_lossy().into_owned();
        let mut capture = CaptureLog::new(&config.capture).unwrap();
        let mut wireless = Wireless::new(RecordingRadio::default());
        let mut stats = LinkStats::default();
        let frame = Frame::from_wire_bytes(b"\x03hello").unwrap();

        handle_frame(&mut wireless, &frame, &config, Some(&mut capture), &mut stats).await;
        capture.flush().unwrap();

        let contents = std::fs::read_to_string(capture.current_path().unwrap()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(r#""kind":"notice""#));
        assert!(lines[0].contains(r#""text":"hello""#));
        assert!(wireless.radio().sent.is_empty());
    }
}
