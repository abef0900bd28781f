//! Per-request step log.
//!
//! Each pipeline step is emitted as a `debug` event the moment it happens
//! and also kept, so a failed response can carry the steps that led up to
//! the failure. The summary line is written when the log is dropped, which
//! covers early returns and cancelled requests alike.

use std::time::Instant;

/// One recorded step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEntry {
    pub step: &'static str,
    pub detail: String,
    /// Milliseconds since the request started.
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Pending,
    Succeeded,
    Failed(&'static str),
}

/// Step log for one store request.
#[derive(Debug)]
pub struct StepLog {
    started: Instant,
    entries: Vec<StepEntry>,
    outcome: Outcome,
}

impl StepLog {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: Vec::new(),
            outcome: Outcome::Pending,
        }
    }

    pub fn step(&mut self, step: &'static str, detail: impl Into<String>) {
        let entry = StepEntry {
            step,
            detail: detail.into(),
            elapsed_ms: self.started.elapsed().as_millis(),
        };
        tracing::debug!(
            step = entry.step,
            elapsed_ms = entry.elapsed_ms as u64,
            "{}",
            entry.detail
        );
        self.entries.push(entry);
    }

    pub fn succeed(&mut self) {
        self.outcome = Outcome::Succeeded;
    }

    /// Mark the request failed with the given error kind.
    pub fn fail(&mut self, kind: &'static str) {
        self.outcome = Outcome::Failed(kind);
    }

    pub fn entries(&self) -> &[StepEntry] {
        &self.entries
    }
}

impl Default for StepLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StepLog {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let steps = self.entries.len();
        let last_step = self.entries.last().map(|e| e.step).unwrap_or("none");
        match self.outcome {
            Outcome::Succeeded => {
                tracing::info!(elapsed_ms, steps, "store request completed")
            }
            Outcome::Failed(kind) => {
                tracing::warn!(elapsed_ms, steps, last_step, kind, "store request failed")
            }
            Outcome::Pending => {
                tracing::warn!(elapsed_ms, steps, last_step, "store request abandoned")
            }
        }
    }
}

/// Render recorded steps as `[   12ms] step: detail` lines.
pub fn render_entries(entries: &[StepEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("[{:>6}ms] {}: {}", e.elapsed_ms, e.step, e.detail))
        .collect::<Vec<_>>()
        .join("\n")
}
