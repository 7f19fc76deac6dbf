//! Run status record, the single communication channel between the pipeline
//! process and the external launcher/UI. Fully rewritten to a JSON file on
//! every transition so a polling reader never sees a partial patch.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub run_id: Uuid,
    pub status: RunState,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub total_count: u32,
    pub current_index: u32,
    pub current_title: String,
    pub updated_count: u32,
    pub skipped_count: u32,
    pub last_updated_at: DateTime<Utc>,
    pub message: String,
}

impl RunStatus {
    /// Start a new run record in the `running` state.
    pub fn begin(total_count: u32) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            status: RunState::Running,
            started_at: now,
            finished_at: None,
            total_count,
            current_index: 0,
            current_title: String::new(),
            updated_count: 0,
            skipped_count: 0,
            last_updated_at: now,
            message: "Run started".to_string(),
        }
    }

    /// Move to a batch item. `current_index` never decreases within a run.
    pub fn step(&mut self, index: u32, title: &str, message: impl Into<String>) {
        debug_assert!(index >= self.current_index);
        self.current_index = index.max(self.current_index);
        self.current_title = title.to_string();
        self.touch(message);
    }

    pub fn record_skip(&mut self, message: impl Into<String>) {
        self.skipped_count += 1;
        self.touch(message);
    }

    pub fn record_update(&mut self, message: impl Into<String>) {
        self.updated_count += 1;
        self.touch(message);
    }

    /// Update the progress message without advancing the batch position.
    pub fn touch(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.last_updated_at = Utc::now();
    }

    pub fn finish_success(&mut self, message: impl Into<String>) {
        self.status = RunState::Success;
        self.finished_at = Some(Utc::now());
        self.touch(message);
    }

    pub fn finish_error(&mut self, message: impl Into<String>) {
        self.status = RunState::Error;
        self.finished_at = Some(Utc::now());
        self.touch(message);
    }

    /// A `running` record whose last update is older than `max_age` belongs
    /// to a crashed run; any other state is never stale.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.status == RunState::Running && Utc::now() - self.last_updated_at > max_age
    }
}

/// Writes the status record to a JSON file, creating the parent directory
/// on first use. The file is always rewritten whole.
pub struct StatusWriter {
    path: PathBuf,
}

impl StatusWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn write(&self, status: &RunStatus) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(status)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!(path = %self.path.display(), status = ?status.status, "Status file written");
        Ok(())
    }

    /// Read a previously written record. A missing file is `Ok(None)`; the
    /// first run of a fresh deployment has nothing to read.
    pub fn read(path: impl AsRef<Path>) -> Result<Option<RunStatus>> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => {
                let status = serde_json::from_str(&json)
                    .with_context(|| format!("Malformed status file {}", path.display()))?;
                Ok(Some(status))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}
