//! Emailing history records.
//!
//! The core only decides which records go out and stamps them once the
//! sender reports success. `OutboxSender` is a file-backed sender that
//! appends each message to a JSONL outbox for a mail relay to pick up.

use crate::{Result, SessionRecord};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Which part of the history to email
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmailScope {
    /// Every record in the ledger
    All,
    /// Records created within the last `days` days
    Recent { days: i64 },
    /// Records containing the catalog pill at `pill_index`
    Filtered { pill_index: usize },
}

/// Delivers a batch of records to a recipient
pub trait EmailSender {
    fn send(&mut self, recipient: &str, records: &[SessionRecord]) -> Result<()>;
}

/// One message written to the outbox
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub recipient: String,
    pub queued_at: DateTime<Utc>,
    pub records: Vec<SessionRecord>,
}

/// JSONL outbox sender with file locking
pub struct OutboxSender {
    path: PathBuf,
}

impl OutboxSender {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl EmailSender for OutboxSender {
    fn send(&mut self, recipient: &str, records: &[SessionRecord]) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let entry = OutboxEntry {
            recipient: recipient.to_string(),
            queued_at: Utc::now(),
            records: records.to_vec(),
        };

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(&entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!(
            "Queued {} records for {} in outbox",
            records.len(),
            recipient
        );
        Ok(())
    }
}

/// Read all queued messages from an outbox file
pub fn read_outbox(path: &Path) -> Result<Vec<OutboxEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<OutboxEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse outbox entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} outbox entries", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dose, Pill};

    fn create_test_record() -> SessionRecord {
        SessionRecord::new(
            vec![Dose::new(Pill::new("Aspirin", 100.0, "mg"), 1)],
            "",
            None,
            Utc::now(),
        )
    }

    #[test]
    fn test_send_and_read_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let outbox_path = temp_dir.path().join("outbox.jsonl");

        let record = create_test_record();
        let mut sender = OutboxSender::new(&outbox_path);
        sender.send("me@example.com", &[record.clone()]).unwrap();
        sender.send("doctor@example.com", &[]).unwrap();

        let entries = read_outbox(&outbox_path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].recipient, "me@example.com");
        assert_eq!(entries[0].records[0].id, record.id);
        assert!(entries[1].records.is_empty());
    }

    #[test]
    fn test_corrupted_lines_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let outbox_path = temp_dir.path().join("outbox.jsonl");
        std::fs::write(&outbox_path, "{ not json }\n").unwrap();

        OutboxSender::new(&outbox_path)
            .send("me@example.com", &[create_test_record()])
            .unwrap();

        assert_eq!(read_outbox(&outbox_path).unwrap().len(), 1);
    }

    #[test]
    fn test_read_missing_outbox() {
        let temp_dir = tempfile::tempdir().unwrap();
        let entries = read_outbox(&temp_dir.path().join("missing.jsonl")).unwrap();
        assert!(entries.is_empty());
    }
}
