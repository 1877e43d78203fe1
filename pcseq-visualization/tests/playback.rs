//! Integration tests for frame playback

use pcseq_core::{Error, Point3f, PointCloudFrame, Result, Rgb};
use pcseq_visualization::*;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Update { points: usize, first_color: Option<Rgb> },
    ResetView,
    Tick,
    Close,
}

/// Records renderer calls; optionally fails or closes on a given tick
#[derive(Default)]
struct RecordingRenderer {
    events: Vec<Event>,
    fail_on_tick: Option<usize>,
    close_on_tick: Option<usize>,
    ticks: usize,
}

impl SceneRenderer for RecordingRenderer {
    fn update_geometry(&mut self, points: &[Point3f], colors: &[Rgb]) -> Result<()> {
        self.events.push(Event::Update {
            points: points.len(),
            first_color: colors.first().copied(),
        });
        Ok(())
    }

    fn reset_view(&mut self) -> Result<()> {
        self.events.push(Event::ResetView);
        Ok(())
    }

    fn render_tick(&mut self) -> Result<bool> {
        self.ticks += 1;
        self.events.push(Event::Tick);
        if Some(self.ticks) == self.fail_on_tick {
            return Err(Error::Render("device lost".into()));
        }
        Ok(Some(self.ticks) != self.close_on_tick)
    }

    fn close(&mut self) {
        self.events.push(Event::Close);
    }
}

fn quick_player() -> Player {
    Player::new(PlayerConfig {
        delay: Duration::ZERO,
        default_color: [0.25, 0.5, 0.75],
    })
}

fn write_frames(dir: &Path) {
    let colored = PointCloudFrame::from_u8_colors(
        vec![Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 1.0, 1.0)],
        Some(vec![[255, 0, 0], [0, 255, 0]]),
    )
    .unwrap();
    let plain = PointCloudFrame::from_points(vec![Point3f::new(50.0, 50.0, 50.0); 3]);

    pcseq_io::write_frame(&colored, dir.join("f1.ply")).unwrap();
    pcseq_io::write_frame(&plain, dir.join("f2.ply")).unwrap();
    pcseq_io::write_frame(&plain, dir.join("f10.ply")).unwrap();
}

#[test]
fn test_plays_in_natural_order_and_resets_view_once() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());

    let mut renderer = RecordingRenderer::default();
    let summary = quick_player()
        .play(dir.path(), &mut renderer, &CancelToken::new())
        .unwrap();

    assert_eq!(summary.frames_shown, 3);
    assert!(summary.last_frame.unwrap().ends_with("f10.ply"));
    assert!(!summary.cancelled);

    let red = [1.0, 0.0, 0.0];
    let fallback = [0.25, 0.5, 0.75];
    assert_eq!(
        renderer.events,
        vec![
            Event::Update { points: 2, first_color: Some(red) },
            Event::ResetView,
            Event::Tick,
            Event::Update { points: 3, first_color: Some(fallback) },
            Event::Tick,
            Event::Update { points: 3, first_color: Some(fallback) },
            Event::Tick,
            Event::Close,
        ]
    );
}

#[test]
fn test_teardown_runs_when_a_frame_is_broken() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());
    fs::write(dir.path().join("f2.ply"), "not a ply").unwrap();

    let mut renderer = RecordingRenderer::default();
    let err = quick_player()
        .play(dir.path(), &mut renderer, &CancelToken::new())
        .unwrap_err();

    assert!(matches!(err, Error::FrameRead { .. }));
    assert_eq!(renderer.events.last(), Some(&Event::Close));
    assert_eq!(renderer.events.iter().filter(|e| **e == Event::Close).count(), 1);
}

#[test]
fn test_teardown_runs_when_rendering_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());

    let mut renderer = RecordingRenderer {
        fail_on_tick: Some(2),
        ..Default::default()
    };
    let err = quick_player()
        .play(dir.path(), &mut renderer, &CancelToken::new())
        .unwrap_err();

    assert!(matches!(err, Error::Render(_)));
    assert_eq!(renderer.events.last(), Some(&Event::Close));
}

#[test]
fn test_closing_the_window_stops_playback() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());

    let mut renderer = RecordingRenderer {
        close_on_tick: Some(1),
        ..Default::default()
    };
    let summary = quick_player()
        .play(dir.path(), &mut renderer, &CancelToken::new())
        .unwrap();

    assert_eq!(summary.frames_shown, 0);
    assert!(summary.window_closed);
    assert_eq!(renderer.ticks, 1);
}

#[test]
fn test_cancelled_before_start_shows_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());

    let cancel = CancelToken::new();
    cancel.cancel();
    let mut renderer = RecordingRenderer::default();
    let summary = quick_player().play(dir.path(), &mut renderer, &cancel).unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.frames_shown, 0);
    assert_eq!(renderer.events, vec![Event::Close]);
}

#[test]
fn test_missing_directory_opens_no_window() {
    let dir = tempfile::tempdir().unwrap();
    let mut renderer = RecordingRenderer::default();
    let err = quick_player()
        .play(dir.path().join("missing"), &mut renderer, &CancelToken::new())
        .unwrap_err();

    assert!(matches!(err, Error::DirectoryNotFound { .. }));
    assert!(renderer.events.is_empty());
}

#[test]
fn test_headless_camera_survives_later_frames() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());

    let mut renderer = HeadlessRenderer::new();
    quick_player()
        .play(dir.path(), &mut renderer, &CancelToken::new())
        .unwrap();

    // Fitted to f1 (centered at 0.5) and not refitted to the far-away frames
    let target = renderer.camera().target;
    assert!((target.x - 0.5).abs() < 1e-6);
    assert_eq!(renderer.points().len(), 3);
    assert_eq!(renderer.ticks(), 3);
    assert!(renderer.is_closed());
}
