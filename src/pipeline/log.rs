//! # Transmission Log
//!
//! Append-only record of one transmission run, shared between the worker that
//! writes frames and anyone polling for progress (the HTTP API, the CLI).
//!
//! Entries are appended whole under a write lock, so readers never see a
//! partially built entry. The log also carries the run's [`RunStatus`]; when
//! a run finishes its final counters land here too, so there is one place to
//! look for both progress and outcome.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

use super::TransmissionResult;
use crate::protocol::frame::{Frame, FrameKind};

/// Timestamp format used when entries are serialized (millisecond precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Outcome of writing one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// One frame's record.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
    /// 1-based position in the submitted sequence
    pub frame_number: usize,
    pub frame_type: FrameKind,
    pub frame_hex: String,
    pub bytes_written: usize,
    pub outcome: Outcome,
}

impl LogEntry {
    /// Entry for a frame the link accepted in full.
    pub fn success(frame_number: usize, frame: &Frame, bytes_written: usize) -> Self {
        Self::new(frame_number, frame.kind(), frame, bytes_written, Outcome::Success)
    }

    /// Entry for a frame the link accepted only partly.
    pub fn short_write(frame_number: usize, frame: &Frame, bytes_written: usize) -> Self {
        let reason = format!(
            "short write: {} of {} bytes",
            bytes_written,
            frame.as_bytes().len()
        );
        Self::new(
            frame_number,
            frame.kind(),
            frame,
            bytes_written,
            Outcome::Failure(reason),
        )
    }

    /// Entry for a frame whose write raised an error.
    pub fn error(frame_number: usize, frame: &Frame, reason: String) -> Self {
        Self::new(frame_number, FrameKind::Error, frame, 0, Outcome::Failure(reason))
    }

    fn new(
        frame_number: usize,
        frame_type: FrameKind,
        frame: &Frame,
        bytes_written: usize,
        outcome: Outcome,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            frame_number,
            frame_type,
            frame_hex: frame.to_hex(),
            bytes_written,
            outcome,
        }
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

/// Where the current (or last) run stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running { total_frames: usize },
    Finished(TransmissionResult),
}

/// Point-in-time copy of the log.
#[derive(Debug, Clone, Serialize)]
pub struct LogSnapshot {
    pub entries: Vec<LogEntry>,
    /// Entries in the log, including any skipped by an offset
    pub total_entries: usize,
    pub status: RunStatus,
}

#[derive(Debug)]
struct LogState {
    entries: Vec<LogEntry>,
    status: RunStatus,
}

/// # Transmission Log
///
/// Cleared once at the start of each run, appended in frame order, never
/// edited in place.
#[derive(Debug)]
pub struct TransmissionLog {
    state: RwLock<LogState>,
}

impl Default for TransmissionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TransmissionLog {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LogState {
                entries: Vec::new(),
                status: RunStatus::Idle,
            }),
        }
    }

    /// Truncate to empty and return to `Idle`.
    pub fn clear(&self) {
        let mut state = self.write();
        state.entries.clear();
        state.status = RunStatus::Idle;
    }

    /// Truncate and mark a run of `total_frames` as in progress.
    pub(crate) fn start_run(&self, total_frames: usize) {
        let mut state = self.write();
        state.entries.clear();
        state.status = RunStatus::Running { total_frames };
    }

    pub(crate) fn append(&self, entry: LogEntry) {
        self.write().entries.push(entry);
    }

    pub(crate) fn finish_run(&self, result: TransmissionResult) {
        self.write().status = RunStatus::Finished(result);
    }

    /// Copy of every entry plus the run status.
    pub fn snapshot(&self) -> LogSnapshot {
        self.snapshot_from(0)
    }

    /// Copy of the entries from index `offset` on, for pollers that already
    /// hold the earlier ones.
    pub fn snapshot_from(&self, offset: usize) -> LogSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let start = offset.min(state.entries.len());
        LogSnapshot {
            entries: state.entries[start..].to_vec(),
            total_entries: state.entries.len(),
            status: state.status.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> RunStatus {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
            .clone()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
