//! pcseq - compress, decompress and play point cloud frame sequences

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use pcseq_codec::QuantizedCodec;
use pcseq_core::{CompressionParams, Error};
use pcseq_pipeline::{BatchConfig, BatchRunner};
use pcseq_visualization::{CancelToken, Player, PlayerConfig, PlaybackSummary};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pcseq", version, about = "Point cloud sequence codec and player")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode every PLY frame of a directory
    Compress {
        /// Directory containing PLY frames
        #[arg(long)]
        input_dir: PathBuf,
        /// Directory receiving encoded frames
        #[arg(long)]
        output_dir: PathBuf,
        /// Quantization bits per axis
        #[arg(long, default_value_t = 8)]
        qp: u8,
        /// Compression level (0-10)
        #[arg(long, default_value_t = 10)]
        cl: u8,
        /// Encode frames on all cores
        #[arg(long)]
        parallel: bool,
    },
    /// Decode every encoded frame of a directory into ASCII PLY
    Decompress {
        /// Directory containing encoded frames
        #[arg(long)]
        input_dir: PathBuf,
        /// Directory receiving PLY frames
        #[arg(long)]
        output_dir: PathBuf,
        /// Decode frames on all cores
        #[arg(long)]
        parallel: bool,
    },
    /// Play PLY frames in order
    Play {
        /// Directory containing PLY frames
        #[arg(short, long)]
        input_dir: PathBuf,
        /// Seconds between frames
        #[arg(short, long, default_value_t = 0.05)]
        delay: f64,
        /// Color (0-1 per channel) for frames without colors
        #[arg(
            short,
            long,
            num_args = 3,
            value_names = ["R", "G", "B"],
            default_values_t = [0.5, 0.5, 0.5]
        )]
        color: Vec<f32>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .init();
}

/// Report a missing input directory and carry on; other errors propagate
fn skip_missing_dir<T>(result: pcseq_core::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e @ Error::DirectoryNotFound { .. }) => {
            error!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn player_config(delay: f64, color: &[f32]) -> Result<PlayerConfig> {
    let delay = Duration::try_from_secs_f64(delay)
        .with_context(|| format!("invalid delay {}", delay))?;
    let [r, g, b] = color else {
        bail!("expected 3 color channels, got {}", color.len());
    };
    let default_color = [*r, *g, *b];
    if default_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
        bail!("color channels must be within 0-1, got {:?}", default_color);
    }
    Ok(PlayerConfig {
        delay,
        default_color,
    })
}

/// Cancel playback on Ctrl-C so the window is torn down cleanly
fn cancel_on_interrupt() -> Result<CancelToken> {
    let cancel = CancelToken::new();
    let handle = cancel.clone();
    ctrlc::set_handler(move || handle.cancel()).context("failed to install Ctrl-C handler")?;
    Ok(cancel)
}

#[cfg(feature = "window")]
fn play(
    player: &Player,
    input_dir: &Path,
    cancel: &CancelToken,
) -> pcseq_core::Result<PlaybackSummary> {
    use pcseq_core::FrameSource;
    use pcseq_visualization::{WindowConfig, WindowRenderer};
    // List first so a missing directory never opens a window
    FrameSource::new(input_dir, "ply").ensure_exists()?;
    let renderer = WindowRenderer::open(&WindowConfig::default());
    player.play(input_dir, renderer, cancel)
}

#[cfg(not(feature = "window"))]
fn play(
    player: &Player,
    input_dir: &Path,
    cancel: &CancelToken,
) -> pcseq_core::Result<PlaybackSummary> {
    player.play(input_dir, pcseq_visualization::HeadlessRenderer::new(), cancel)
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Compress {
            input_dir,
            output_dir,
            qp,
            cl,
            parallel,
        } => {
            let params = CompressionParams::new(qp, cl);
            let config = BatchConfig::new(input_dir, output_dir).with_parallel(parallel);
            let runner = BatchRunner::new(QuantizedCodec::new(), config);
            if let Some(report) = skip_missing_dir(runner.compress(&params))? {
                println!("{}", report);
            }
        }
        Command::Decompress {
            input_dir,
            output_dir,
            parallel,
        } => {
            let config = BatchConfig::new(input_dir, output_dir).with_parallel(parallel);
            let runner = BatchRunner::new(QuantizedCodec::new(), config);
            if let Some(report) = skip_missing_dir(runner.decompress())? {
                println!("{}", report);
            }
        }
        Command::Play {
            input_dir,
            delay,
            color,
        } => {
            let player = Player::new(player_config(delay, &color)?);
            let cancel = cancel_on_interrupt()?;
            let result = play(&player, &input_dir, &cancel);
            if let Some(summary) = skip_missing_dir(result).context("playback stopped")? {
                if summary.cancelled {
                    info!("playback interrupted");
                }
                info!("played {} frames", summary.frames_shown);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli.command)
}
