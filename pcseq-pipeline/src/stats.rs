//! Streaming statistics for a batch run

use crate::runner::FrameOutcome;
use std::time::Duration;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Measurements of one successfully processed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetrics {
    /// Size of the source file
    pub input_bytes: u64,
    /// Size of the written output file
    pub output_bytes: u64,
    /// Time spent inside the codec call only
    pub codec_time: Duration,
}

/// Accumulator for one run.
///
/// Ratios and rates are derived on read; nothing here walks the frames again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub total: usize,
    pub success: usize,
    pub fail: usize,
    pub input_bytes_total: u64,
    pub output_bytes_total: u64,
    pub codec_time_total: Duration,
}

impl RunStats {
    /// Start a run over `total` frames
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, input_bytes: u64, output_bytes: u64, duration: Duration) {
        self.success += 1;
        self.input_bytes_total += input_bytes;
        self.output_bytes_total += output_bytes;
        self.codec_time_total += duration;
    }

    pub fn record_failure(&mut self) {
        self.fail += 1;
    }

    /// Fold one frame outcome into the totals
    pub fn record(&mut self, outcome: &FrameOutcome) {
        match &outcome.result {
            Ok(m) => self.record_success(m.input_bytes, m.output_bytes, m.codec_time),
            Err(_) => self.record_failure(),
        }
    }

    /// Frames not yet accounted for
    pub fn pending(&self) -> usize {
        self.total.saturating_sub(self.success + self.fail)
    }

    /// Cumulative input/output byte ratio; `None` until some output exists
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.output_bytes_total == 0 {
            return None;
        }
        Some(self.input_bytes_total as f64 / self.output_bytes_total as f64)
    }

    /// Successful frames per second of codec time; 0 when no time has elapsed
    pub fn throughput_fps(&self) -> f64 {
        let secs = self.codec_time_total.as_secs_f64();
        if secs > 0.0 {
            self.success as f64 / secs
        } else {
            0.0
        }
    }

    pub fn input_megabytes(&self) -> f64 {
        self.input_bytes_total as f64 / BYTES_PER_MEGABYTE
    }

    pub fn output_megabytes(&self) -> f64 {
        self.output_bytes_total as f64 / BYTES_PER_MEGABYTE
    }
}

/// Render an optional ratio the way reports show it
pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.1}x", r),
        None => "n/a".to_string(),
    }
}
