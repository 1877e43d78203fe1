//! Batch runner with per-frame failure isolation

use crate::report::{Direction, ProgressRecord, RunReport};
use crate::stats::{FrameMetrics, RunStats};
use log::{info, warn};
use pcseq_codec::Codec;
use pcseq_core::{CompressionParams, Error, FrameSource, Result};
use pcseq_io::FRAME_EXTENSION;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Directories and scheduling for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Run codec calls on the rayon pool; reporting stays in frame order
    pub parallel: bool,
}

impl BatchConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Step of the per-frame state machine where a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    ReadInput,
    CodecCall,
    WriteOutput,
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameStage::ReadInput => "read",
            FrameStage::CodecCall => "codec",
            FrameStage::WriteOutput => "write",
        };
        f.write_str(name)
    }
}

/// The `Failed` terminal state, carrying the triggering error
#[derive(Debug)]
pub struct FrameFailure {
    pub stage: FrameStage,
    pub error: Error,
}

impl FrameFailure {
    fn at(stage: FrameStage) -> impl FnOnce(Error) -> Self {
        move |error| Self { stage, error }
    }
}

impl fmt::Display for FrameFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage: {}", self.stage, self.error)
    }
}

/// Terminal state of one frame
#[derive(Debug)]
pub struct FrameOutcome {
    /// 1-based position in the ordered sequence
    pub index: usize,
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: std::result::Result<FrameMetrics, FrameFailure>,
}

impl FrameOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Receives frame results in sequence order as a run progresses
pub trait RunObserver {
    fn on_success(&mut self, record: &ProgressRecord);

    fn on_failure(&mut self, outcome: &FrameOutcome, failure: &FrameFailure);
}

/// Observer that writes progress to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn on_success(&mut self, record: &ProgressRecord) {
        info!("{}", record);
    }

    fn on_failure(&mut self, outcome: &FrameOutcome, failure: &FrameFailure) {
        warn!("{} failed ({})", display_name(&outcome.input), failure);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_len(path: &Path) -> std::io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}

/// For each output path, the index of an earlier frame writing the same path.
///
/// `f1.ply` and `f1.PLY` share a stem; only the first in sequence order may
/// write the output.
fn first_claims(outputs: &[PathBuf]) -> Vec<Option<usize>> {
    let mut claims: HashMap<&Path, usize> = HashMap::new();
    outputs
        .iter()
        .enumerate()
        .map(|(i, output)| match claims.entry(output.as_path()) {
            Entry::Occupied(first) => Some(*first.get()),
            Entry::Vacant(slot) => {
                slot.insert(i);
                None
            }
        })
        .collect()
}

/// Keep codec failures inside the encode/decode error kinds
fn codec_error(direction: Direction, error: Error) -> Error {
    match (direction, error) {
        (_, e @ (Error::Encode(_) | Error::Decode(_))) => e,
        (Direction::Compress, e) => Error::Encode(e.to_string()),
        (Direction::Decompress, e) => Error::Decode(e.to_string()),
    }
}

/// Drives frames from a directory through a codec into another directory
pub struct BatchRunner<C> {
    codec: C,
    config: BatchConfig,
}

impl<C: Codec> BatchRunner<C> {
    pub fn new(codec: C, config: BatchConfig) -> Self {
        Self { codec, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Encode every `.ply` frame of the input directory, logging progress
    pub fn compress(&self, params: &CompressionParams) -> Result<RunReport> {
        self.compress_with(params, &mut LogObserver)
    }

    pub fn compress_with(
        &self,
        params: &CompressionParams,
        observer: &mut dyn RunObserver,
    ) -> Result<RunReport> {
        params.validate()?;
        info!(
            "compressing (quantization bits {}, compression level {})",
            params.quantization_bits, params.compression_level
        );
        let source = FrameSource::new(&self.config.input_dir, FRAME_EXTENSION);
        self.run(
            Direction::Compress,
            &source,
            self.codec.extension(),
            observer,
            |input, output| self.compress_frame(input, output, params),
        )
    }

    /// Decode every encoded frame of the input directory, logging progress
    pub fn decompress(&self) -> Result<RunReport> {
        self.decompress_with(&mut LogObserver)
    }

    pub fn decompress_with(&self, observer: &mut dyn RunObserver) -> Result<RunReport> {
        let source = FrameSource::new(&self.config.input_dir, self.codec.extension());
        self.run(
            Direction::Decompress,
            &source,
            FRAME_EXTENSION,
            observer,
            |input, output| self.decompress_frame(input, output),
        )
    }

    fn output_path(&self, input: &Path, extension: &str) -> PathBuf {
        let mut name = input.file_stem().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(extension);
        self.config.output_dir.join(name)
    }

    fn run<F>(
        &self,
        direction: Direction,
        source: &FrameSource,
        output_extension: &str,
        observer: &mut dyn RunObserver,
        process: F,
    ) -> Result<RunReport>
    where
        F: Fn(&Path, &Path) -> std::result::Result<FrameMetrics, FrameFailure> + Sync,
    {
        let started = Instant::now();
        let frames = source.frames()?;
        fs::create_dir_all(&self.config.output_dir)?;

        info!(
            "starting {} of {} frames: {} -> {}",
            direction,
            frames.len(),
            self.config.input_dir.display(),
            self.config.output_dir.display()
        );

        let outputs: Vec<PathBuf> = frames
            .iter()
            .map(|input| self.output_path(input, output_extension))
            .collect();
        let claimed_by = first_claims(&outputs);

        let process_one = |i: usize| {
            let input = &frames[i];
            let output = &outputs[i];
            let result = match claimed_by[i] {
                Some(first) => Err(FrameFailure {
                    stage: FrameStage::WriteOutput,
                    error: Error::frame_write(
                        output,
                        format!("already written from {}", display_name(&frames[first])),
                    ),
                }),
                None => process(input, output),
            };
            FrameOutcome {
                index: i + 1,
                input: input.clone(),
                output: output.clone(),
                result,
            }
        };

        let mut stats = RunStats::new(frames.len());
        if self.config.parallel {
            let outcomes: Vec<FrameOutcome> =
                (0..frames.len()).into_par_iter().map(&process_one).collect();
            for outcome in &outcomes {
                Self::fold(direction, &mut stats, outcome, observer);
            }
        } else {
            for outcome in (0..frames.len()).map(&process_one) {
                Self::fold(direction, &mut stats, &outcome, observer);
            }
        }

        Ok(RunReport {
            direction,
            stats,
            wall_time: started.elapsed(),
        })
    }

    fn fold(
        direction: Direction,
        stats: &mut RunStats,
        outcome: &FrameOutcome,
        observer: &mut dyn RunObserver,
    ) {
        stats.record(outcome);
        match &outcome.result {
            Ok(metrics) => {
                let record = ProgressRecord::new(
                    direction,
                    outcome.index,
                    display_name(&outcome.input),
                    display_name(&outcome.output),
                    metrics.codec_time,
                    stats,
                );
                observer.on_success(&record);
            }
            Err(failure) => observer.on_failure(outcome, failure),
        }
    }

    fn compress_frame(
        &self,
        input: &Path,
        output: &Path,
        params: &CompressionParams,
    ) -> std::result::Result<FrameMetrics, FrameFailure> {
        let frame = pcseq_io::read_frame(input).map_err(FrameFailure::at(FrameStage::ReadInput))?;
        let input_bytes = file_len(input)
            .map_err(|e| Error::frame_read(input, e))
            .map_err(FrameFailure::at(FrameStage::ReadInput))?;

        let started = Instant::now();
        let encoded = self
            .codec
            .encode(frame, params)
            .map_err(|e| codec_error(Direction::Compress, e))
            .map_err(FrameFailure::at(FrameStage::CodecCall))?;
        let codec_time = started.elapsed();

        let output_bytes = fs::write(output, &encoded)
            .and_then(|_| file_len(output))
            .map_err(|e| Error::frame_write(output, e))
            .map_err(FrameFailure::at(FrameStage::WriteOutput))?;

        Ok(FrameMetrics {
            input_bytes,
            output_bytes,
            codec_time,
        })
    }

    fn decompress_frame(
        &self,
        input: &Path,
        output: &Path,
    ) -> std::result::Result<FrameMetrics, FrameFailure> {
        let bytes = fs::read(input)
            .map_err(|e| Error::frame_read(input, e))
            .map_err(FrameFailure::at(FrameStage::ReadInput))?;

        let started = Instant::now();
        let frame = self
            .codec
            .decode(&bytes)
            .map_err(|e| codec_error(Direction::Decompress, e))
            .map_err(FrameFailure::at(FrameStage::CodecCall))?;
        let codec_time = started.elapsed();

        pcseq_io::write_frame(&frame, output).map_err(FrameFailure::at(FrameStage::WriteOutput))?;
        let output_bytes = file_len(output)
            .map_err(|e| Error::frame_write(output, e))
            .map_err(FrameFailure::at(FrameStage::WriteOutput))?;

        Ok(FrameMetrics {
            input_bytes: bytes.len() as u64,
            output_bytes,
            codec_time,
        })
    }
}
