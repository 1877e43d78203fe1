//! Per-frame progress lines and the final run summary

use crate::stats::{format_ratio, RunStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which way frames flow through the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Compress,
    Decompress,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Compress => write!(f, "compress"),
            Direction::Decompress => write!(f, "decompress"),
        }
    }
}

/// One progress line, emitted after a frame succeeds
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub direction: Direction,
    /// 1-based position in the sequence
    pub index: usize,
    pub total: usize,
    pub input_name: String,
    pub output_name: String,
    /// Ratio over all frames so far, not just this one
    pub cumulative_ratio: Option<f64>,
    pub elapsed: Duration,
}

impl ProgressRecord {
    /// Snapshot the running totals after frame `index`
    pub fn new(
        direction: Direction,
        index: usize,
        input_name: impl Into<String>,
        output_name: impl Into<String>,
        elapsed: Duration,
        stats: &RunStats,
    ) -> Self {
        Self {
            direction,
            index,
            total: stats.total,
            input_name: input_name.into(),
            output_name: output_name.into(),
            cumulative_ratio: stats.compression_ratio(),
            elapsed,
        }
    }
}

impl fmt::Display for ProgressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {:<10} -> {}",
            self.index, self.total, self.input_name, self.output_name
        )?;
        if self.direction == Direction::Compress {
            write!(f, " | ratio: {}", format_ratio(self.cumulative_ratio))?;
        }
        write!(f, " | time: {:.4}s", self.elapsed.as_secs_f64())
    }
}

/// Summary of a finished run, derived only from its statistics
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub direction: Direction,
    pub stats: RunStats,
    /// Wall time of the whole run including I/O
    pub wall_time: Duration,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "{} finished ({}/{})", self.direction, s.success, s.total)?;
        writeln!(f, "{}", "-".repeat(60))?;
        writeln!(f, "failed frames:   {}", s.fail)?;
        writeln!(f, "codec time:      {:.4}s", s.codec_time_total.as_secs_f64())?;
        writeln!(f, "wall time:       {:.4}s", self.wall_time.as_secs_f64())?;
        if self.direction == Direction::Compress {
            writeln!(f, "input total:     {:.2} MB", s.input_megabytes())?;
            writeln!(f, "output total:    {:.2} MB", s.output_megabytes())?;
            writeln!(f, "average ratio:   {}", format_ratio(s.compression_ratio()))?;
        }
        writeln!(f, "throughput:      {:.2} fps", s.throughput_fps())?;
        write!(f, "{}", rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line_uses_running_totals() {
        let mut stats = RunStats::new(5);
        stats.record_success(1000, 100, Duration::from_millis(5));
        stats.record_success(2000, 200, Duration::from_millis(5));

        let record = ProgressRecord::new(
            Direction::Compress,
            2,
            "f2.ply",
            "f2.pcq",
            Duration::from_millis(5),
            &stats,
        );
        assert_eq!(record.cumulative_ratio, Some(10.0));
        let line = record.to_string();
        assert!(line.starts_with("[2/5] f2.ply"));
        assert!(line.contains("ratio: 10.0x"));
        assert!(line.contains("time: 0.0050s"));
    }

    #[test]
    fn test_decompress_lines_have_no_ratio() {
        let stats = RunStats::new(1);
        let record = ProgressRecord::new(
            Direction::Decompress,
            1,
            "f1.pcq",
            "f1.ply",
            Duration::ZERO,
            &stats,
        );
        assert!(!record.to_string().contains("ratio"));
    }

    #[test]
    fn test_report_without_output_bytes() {
        let report = RunReport {
            direction: Direction::Compress,
            stats: RunStats::new(0),
            wall_time: Duration::ZERO,
        };
        let text = report.to_string();
        assert!(text.contains("compress finished (0/0)"));
        assert!(text.contains("average ratio:   n/a"));
        assert!(text.contains("throughput:      0.00 fps"));
    }
}
