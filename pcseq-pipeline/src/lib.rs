//! Batch codec pipeline
//!
//! Drives an ordered sequence of frame files through a [`Codec`], one
//! outcome per frame, and accumulates statistics for the whole run:
//! - [`BatchRunner`] for compress and decompress runs
//! - [`RunStats`] for running and final metrics
//! - [`ProgressRecord`] and [`RunReport`] for what gets reported

pub mod report;
pub mod runner;
pub mod stats;

pub use report::*;
pub use runner::*;
pub use stats::*;

pub use pcseq_codec::Codec;
