use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::engine::events::NormalizedEvent;
use crate::engine::sink::EventSink;
use crate::error::SinkError;
use crate::util::ensure_dir;

/// Appends one JSON line per event to a file.
#[derive(Debug)]
pub struct FileEventSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileEventSink {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open event file {:?}", path))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for FileEventSink {
    fn emit(&self, event: &NormalizedEvent) -> Result<(), SinkError> {
        let mut line = event.to_json()?;
        line.push('\n');

        let mut file = self
            .file
            .lock()
            .map_err(|_| SinkError::Rejected(format!("{:?} writer poisoned", self.path)))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pipeline;
    use crate::execution_id::ExecutionId;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn appends_json_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/events.jsonl");
        let sink = FileEventSink::open(&path).unwrap();
        let exec = ExecutionId::from("x");

        sink.emit(&pipeline::created(&exec, false, Utc::now())).unwrap();
        sink.emit(&pipeline::completed(&exec, true, Utc::now())).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "Created");
        assert_eq!(lines[1]["isComplete"], true);
    }
}
