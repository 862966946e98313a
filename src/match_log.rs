//! Append-only logs of fuzzy matches for offline review.
//!
//! Two logs use this type: the audit log (every accepted semantic match)
//! and the miss log (ranked candidates of every rejected query, for
//! threshold tuning). Neither is ever read back by the matcher.
//!
//! Records are sent over a channel to a single writer thread, which
//! appends one JSON object per line. [`MatchLog::record`] never blocks on
//! file I/O and never fails; write errors are reported with `tracing` and
//! the record is dropped. Dropping the log flushes pending records.

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use chrono::Utc;

/// One scored vocabulary term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTerm {
    pub term: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchEvent {
    /// A phrase resolved through the semantic fallback.
    Accepted {
        phrase: String,
        canonical_name: String,
        score: f32,
    },
    /// A semantic query whose best score was below the threshold.
    Rejected {
        query: String,
        threshold: f32,
        candidates: Vec<ScoredTerm>,
    },
}

#[derive(Serialize)]
struct LogLine<'a> {
    ts: String,
    #[serde(flatten)]
    event: &'a MatchEvent,
}

pub struct MatchLog {
    // `Sender` is `Send` but only `Sync` on recent toolchains; the mutex
    // keeps the log shareable across request threads either way.
    sender: Option<Mutex<Sender<MatchEvent>>>,
    writer: Option<JoinHandle<()>>,
    path: Option<PathBuf>,
}

impl MatchLog {
    /// A log that discards every record.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            writer: None,
            path: None,
        }
    }

    /// Open (or create) `path` for appending and start the writer thread.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open match log: {}", path.display()))?;

        let (sender, receiver) = mpsc::channel::<MatchEvent>();
        let log_path = path.to_path_buf();
        let writer = std::thread::Builder::new()
            .name("match-log".to_string())
            .spawn(move || write_loop(file, receiver, &log_path))
            .context("Failed to spawn match log writer")?;

        Ok(Self {
            sender: Some(Mutex::new(sender)),
            writer: Some(writer),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open `path` when set, otherwise return a disabled log.
    pub fn open_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::open(p),
            None => Ok(Self::disabled()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, event: MatchEvent) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.lock() {
            Ok(tx) => {
                if tx.send(event).is_err() {
                    tracing::warn!("match log writer has stopped; record dropped");
                }
            }
            Err(_) => tracing::warn!("match log sender lock poisoned; record dropped"),
        }
    }
}

impl Drop for MatchLog {
    fn drop(&mut self) {
        // Closing the channel ends the writer loop after it drains.
        self.sender.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                tracing::warn!("match log writer panicked");
            }
        }
    }
}

fn write_loop(file: File, receiver: mpsc::Receiver<MatchEvent>, path: &Path) {
    let mut out = BufWriter::new(file);
    for event in receiver {
        let line = LogLine {
            ts: Utc::now().to_rfc3339(),
            event: &event,
        };
        let written = serde_json::to_string(&line)
            .map_err(std::io::Error::from)
            .and_then(|json| writeln!(out, "{}", json))
            .and_then(|_| out.flush());
        if let Err(e) = written {
            tracing::warn!(path = %path.display(), error = %e, "failed to append match log record");
        }
    }
}
