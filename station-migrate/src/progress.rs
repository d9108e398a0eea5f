// Progress reporting shared by every write phase
use tracing::info;

use crate::config::PROGRESS_REPORT_INTERVAL;

/// Receives progress from the writer. One reporter is threaded through the
/// whole run; each phase relabels it with `begin_phase`.
pub trait ProgressReporter: Send {
    /// Starts a new phase and resets the counter to zero out of `total`.
    fn begin_phase(&mut self, phase: &str, total: usize);

    /// Adds `n` processed items to the current phase.
    fn advance(&mut self, n: usize);
}

/// Reports progress through `tracing`, every `interval` items and on
/// completion of a phase.
pub struct LogProgress {
    phase: String,
    total: usize,
    processed: usize,
    last_reported: usize,
    interval: usize,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::with_interval(PROGRESS_REPORT_INTERVAL)
    }

    pub fn with_interval(interval: usize) -> Self {
        Self {
            phase: String::new(),
            total: 0,
            processed: 0,
            last_reported: 0,
            interval: interval.max(1),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for LogProgress {
    fn begin_phase(&mut self, phase: &str, total: usize) {
        self.phase = phase.to_string();
        self.total = total;
        self.processed = 0;
        self.last_reported = 0;
        info!(phase, total, "Starting phase");
    }

    fn advance(&mut self, n: usize) {
        self.processed += n;
        let done = self.processed >= self.total;
        if done || self.processed - self.last_reported >= self.interval {
            self.last_reported = self.processed;
            info!(
                phase = %self.phase,
                processed = self.processed,
                total = self.total,
                "Progress: {}/{}",
                self.processed,
                self.total
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Begin { phase: String, total: usize },
    Advance { phase: String, n: usize },
}

/// Keeps every progress event in memory.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub events: Vec<ProgressEvent>,
    current: String,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase labels in the order they began.
    pub fn phases(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Begin { phase, .. } => Some(phase.as_str()),
                ProgressEvent::Advance { .. } => None,
            })
            .collect()
    }

    /// Every `advance` amount reported during `phase`.
    pub fn advances(&self, phase: &str) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Advance { phase: p, n } if p == phase => Some(*n),
                _ => None,
            })
            .collect()
    }

    /// Total announced when `phase` began.
    pub fn total(&self, phase: &str) -> Option<usize> {
        self.events.iter().find_map(|event| match event {
            ProgressEvent::Begin { phase: p, total } if p == phase => Some(*total),
            _ => None,
        })
    }
}

impl ProgressReporter for RecordingProgress {
    fn begin_phase(&mut self, phase: &str, total: usize) {
        self.current = phase.to_string();
        self.events.push(ProgressEvent::Begin {
            phase: phase.to_string(),
            total,
        });
    }

    fn advance(&mut self, n: usize) {
        self.events.push(ProgressEvent::Advance {
            phase: self.current.clone(),
            n,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_attributes_advances_to_the_current_phase() {
        let mut progress = RecordingProgress::new();
        progress.begin_phase("regions", 2);
        progress.advance(2);
        progress.begin_phase("operators", 1);
        progress.advance(1);

        assert_eq!(progress.phases(), vec!["regions", "operators"]);
        assert_eq!(progress.advances("regions"), vec![2]);
        assert_eq!(progress.total("operators"), Some(1));
    }

    #[test]
    fn log_progress_resets_between_phases() {
        let mut progress = LogProgress::with_interval(10);
        progress.begin_phase("cells", 25);
        progress.advance(12);
        progress.advance(13);
        assert_eq!(progress.processed, 25);

        progress.begin_phase("cells:gsm", 3);
        assert_eq!(progress.processed, 0);
        assert_eq!(progress.total, 3);
    }
}
