//! # Capture Writer
//!
//! Appends [`FrameRecord`]s to JSONL files, starting a new file every
//! `max_records_per_file` records and keeping the newest `max_files_to_keep`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use super::record::FrameRecord;
use crate::config::CaptureConfig;
use crate::error::Result;

const FILE_PREFIX: &str = "capture_";
const FILE_EXTENSION: &str = "jsonl";

/// Rotating JSONL writer for received frames
#[derive(Debug)]
pub struct CaptureLog {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    files_opened: u64,
}

impl CaptureLog {
    /// Create the capture directory if needed
    ///
    /// No file is opened until the first record arrives.
    pub fn new(config: &CaptureConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&dir)?;
        info!("Capturing frames to {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            files_opened: 0,
        })
    }

    /// Append one record as a JSON line
    pub fn append(&mut self, record: &FrameRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let line = record.to_json_line()?;
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
        }
        self.records_in_file += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// File currently being written
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    fn rotate(&mut self) -> Result<()> {
        self.flush()?;

        let name = format!(
            "{}{}_{:06}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.files_opened,
            FILE_EXTENSION
        );
        let path = self.dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened capture file {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;
        self.files_opened += 1;

        self.prune()
    }

    /// Capture files in the directory, oldest first
    fn capture_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                let is_capture = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FILE_PREFIX));
                is_capture && path.extension().is_some_and(|ext| ext == FILE_EXTENSION)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn prune(&self) -> Result<()> {
        let files = self.capture_files()?;
        let excess = files.len().saturating_sub(self.max_files_to_keep);

        for path in &files[..excess] {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed old capture file {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Frame;
    use tempfile::tempdir;

    fn config(dir: &Path, per_file: usize, keep: usize) -> CaptureConfig {
        CaptureConfig {
            enabled: true,
            log_dir: dir.to_string_lossy().into_owned(),
            max_records_per_file: per_file,
            max_files_to_keep: keep,
        }
    }

    fn notice(text: &str) -> FrameRecord {
        let mut wire = vec![0x03];
        wire.extend_from_slice(text.as_bytes());
        FrameRecord::from_frame(&Frame::from_wire_bytes(&wire).unwrap())
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_creates_directory_lazily_opens_file() {
        let root = tempdir().unwrap();
        let dir = root.path().join("captures");
        let log = CaptureLog::new(&config(&dir, 10, 3)).unwrap();

        assert!(dir.is_dir());
        assert!(log.current_path().is_none());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_append_writes_json_lines() {
        let dir = tempdir().unwrap();
        let mut log = CaptureLog::new(&config(dir.path(), 10, 3)).unwrap();

        log.append(&notice("one")).unwrap();
        log.append(&notice("two")).unwrap();
        log.flush().unwrap();

        let lines = read_lines(log.current_path().unwrap());
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["text"], "one");
        assert_eq!(first["kind"], "notice");
    }

    #[test]
    fn test_rotates_after_max_records() {
        let dir = tempdir().unwrap();
        let mut log = CaptureLog::new(&config(dir.path(), 2, 10)).unwrap();

        for text in ["a", "b", "c"] {
            log.append(&notice(text)).unwrap();
        }
        log.flush().unwrap();

        let files = log.capture_files().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(read_lines(&files[0]).len(), 2);
        assert_eq!(read_lines(&files[1]).len(), 1);
        assert_eq!(log.current_path(), Some(files[1].as_path()));
    }

    #[test]
    fn test_keeps_newest_files() {
        let dir = tempdir().unwrap();
        let mut log = CaptureLog::new(&config(dir.path(), 2, 2)).unwrap();

        for text in ["1", "2", "3", "4", "5", "6", "7"] {
            log.append(&notice(text)).unwrap();
        }
        log.flush().unwrap();

        let files = log.capture_files().unwrap();
        assert_eq!(files.len(), 2);

        let texts: Vec<String> = files
            .iter()
            .flat_map(|path| read_lines(path))
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(&line).unwrap();
                value["text"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(texts, vec!["5", "6", "7"]);
    }

    #[test]
    fn test_prune_ignores_foreign_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        fs::write(dir.path().join("capture_old.json"), "keep me too").unwrap();

        let mut log = CaptureLog::new(&config(dir.path(), 1, 1)).unwrap();
        for text in ["x", "y", "z"] {
            log.append(&notice(text)).unwrap();
        }

        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("capture_old.json").exists());
        assert_eq!(log.capture_files().unwrap().len(), 1);
    }
}
