//! Epoch progress: a dot roughly every 10% of an epoch, then a summary line.

use std::io::{self, Write};

/// Decides which minibatches of an epoch emit a progress tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTicker {
    batches: usize,
    interval: usize,
}

impl ProgressTicker {
    /// Ticker for an epoch over `total_samples` rows in minibatches of
    /// `batch_size`.
    pub fn new(total_samples: usize, batch_size: usize) -> Self {
        let batches = total_samples.div_ceil(batch_size.max(1));
        Self {
            batches,
            interval: batches.div_ceil(10).max(1),
        }
    }

    /// Minibatches per epoch, `ceil(total / batch_size)`.
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn ticks_at(&self, batch_index: usize) -> bool {
        batch_index % self.interval == 0
    }

    pub fn ticks_per_epoch(&self) -> usize {
        self.batches.div_ceil(self.interval)
    }
}

/// Destination for human-readable training progress.
pub trait ProgressSink {
    /// Start a line, e.g. `epoch 3 : `.
    fn begin(&mut self, label: &str);
    /// One progress dot.
    fn tick(&mut self);
    /// Finish the current line with a summary.
    fn finish(&mut self, summary: &str);
    /// A standalone line (stage headers).
    fn message(&mut self, text: &str);
}

/// Writes progress to stdout, flushing after partial lines.
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ConsoleProgress {
    fn write_partial(text: &str) {
        let mut out = io::stdout().lock();
        // progress output is best effort
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

impl ProgressSink for ConsoleProgress {
    fn begin(&mut self, label: &str) {
        Self::write_partial(label);
    }

    fn tick(&mut self) {
        Self::write_partial(".");
    }

    fn finish(&mut self, summary: &str) {
        println!("{summary}");
    }

    fn message(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Keeps completed lines in memory; used by tests and quiet runs.
#[derive(Debug, Default)]
pub struct RecordedProgress {
    pub lines: Vec<String>,
    current: String,
}

impl RecordedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dots on each completed progress line.
    pub fn tick_counts(&self) -> Vec<usize> {
        self.lines
            .iter()
            .filter(|l| l.contains(" : "))
            .map(|l| {
                l.split(" : ")
                    .nth(1)
                    .map(|rest| rest.chars().take_while(|&c| c == '.').count())
                    .unwrap_or(0)
            })
            .collect()
    }
}

impl ProgressSink for RecordedProgress {
    fn begin(&mut self, label: &str) {
        self.current.clear();
        self.current.push_str(label);
    }

    fn tick(&mut self) {
        self.current.push('.');
    }

    fn finish(&mut self, summary: &str) {
        self.current.push_str(summary);
        self.lines.push(std::mem::take(&mut self.current));
    }

    fn message(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_ticks_when_batches_divide_evenly() {
        let ticker = ProgressTicker::new(10_000, 100);
        assert_eq!(ticker.batches(), 100);
        assert_eq!(ticker.ticks_per_epoch(), 10);
    }

    #[test]
    fn reference_run_ticks() {
        // 10000 / 32 -> 313 batches, a tick every 32 batches
        let ticker = ProgressTicker::new(10_000, 32);
        assert_eq!(ticker.batches(), 313);
        assert!(ticker.ticks_at(0));
        assert!(ticker.ticks_at(32));
        assert!(!ticker.ticks_at(33));
        assert_eq!(ticker.ticks_per_epoch(), 10);

        let counted = (0..ticker.batches()).filter(|&i| ticker.ticks_at(i)).count();
        assert_eq!(counted, ticker.ticks_per_epoch());
    }

    #[test]
    fn small_epochs_tick_every_batch() {
        let ticker = ProgressTicker::new(5, 32);
        assert_eq!(ticker.batches(), 1);
        assert_eq!(ticker.ticks_per_epoch(), 1);
        assert!(ticker.ticks_at(0));
    }

    #[test]
    fn empty_epoch_does_not_divide_by_zero() {
        let ticker = ProgressTicker::new(0, 0);
        assert_eq!(ticker.batches(), 0);
        assert!(ticker.ticks_at(3));
        assert_eq!(ticker.ticks_per_epoch(), 0);
    }

    #[test]
    fn recorded_progress_assembles_lines() {
        let mut sink = RecordedProgress::new();
        sink.message("EPOCH 1");
        sink.begin("epoch 1 : ");
        sink.tick();
        sink.tick();
        sink.finish(" average_train_NLL = 1.0000");
        assert_eq!(sink.lines, vec!["EPOCH 1", "epoch 1 : .. average_train_NLL = 1.0000"]);
        assert_eq!(sink.tick_counts(), vec![2]);
    }
}
