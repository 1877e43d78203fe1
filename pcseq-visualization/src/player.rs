//! Fixed-cadence playback of a frame sequence

use crate::renderer::{RenderWindow, SceneRenderer};
use log::info;
use pcseq_core::{FrameSource, Result, Rgb};
use pcseq_io::FRAME_EXTENSION;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest single sleep between cancellation checks
const PACING_SLICE: Duration = Duration::from_millis(10);

/// Playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Pause after each displayed frame
    pub delay: Duration,
    /// Color for every point of frames without colors
    pub default_color: Rgb,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(50),
            default_color: [0.5, 0.5, 0.5],
        }
    }
}

/// Shared flag asking a running playback to stop
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a playback ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub frames_shown: usize,
    pub last_frame: Option<PathBuf>,
    pub cancelled: bool,
    pub window_closed: bool,
}

/// Plays uncompressed frames through a renderer at a fixed cadence
#[derive(Debug, Clone, Default)]
pub struct Player {
    config: PlayerConfig,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Show every `.ply` frame of `dir` in natural order.
    ///
    /// The view is fitted on the first frame only, so camera changes made
    /// while playing survive later frames. The renderer is closed before this
    /// returns, also when a frame fails to load or render.
    pub fn play<R: SceneRenderer>(
        &self,
        dir: impl Into<PathBuf>,
        renderer: R,
        cancel: &CancelToken,
    ) -> Result<PlaybackSummary> {
        let frames = FrameSource::new(dir, FRAME_EXTENSION).frames()?;
        info!("playing {} frames", frames.len());

        let mut window = RenderWindow::open(renderer);
        let mut summary = PlaybackSummary::default();

        for (i, path) in frames.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let frame = pcseq_io::read_frame(path)?;
            let colors = frame.colors_or(self.config.default_color);
            window.update_geometry(frame.points(), &colors)?;
            if i == 0 {
                window.reset_view()?;
            }

            if !window.render_tick()? {
                info!("window closed, stopping playback");
                summary.window_closed = true;
                break;
            }
            summary.frames_shown += 1;
            summary.last_frame = Some(path.clone());
            info!("current frame: {}", path.display());

            if !self.pace(cancel) {
                summary.cancelled = true;
                break;
            }
        }

        window.close();
        Ok(summary)
    }

    /// Wait out the frame delay; `false` if cancelled meanwhile
    fn pace(&self, cancel: &CancelToken) -> bool {
        let deadline = Instant::now() + self.config.delay;
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(PACING_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.delay, Duration::from_millis(50));
        assert_eq!(config.default_color, [0.5; 3]);
    }

    #[test]
    fn test_pace_returns_early_when_cancelled() {
        let player = Player::new(PlayerConfig {
            delay: Duration::from_secs(60),
            ..PlayerConfig::default()
        });
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        let started = Instant::now();
        assert!(!player.pace(&cancel));
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_pace_zero_delay() {
        let player = Player::new(PlayerConfig {
            delay: Duration::ZERO,
            ..PlayerConfig::default()
        });
        assert!(player.pace(&CancelToken::new()));
    }
}
