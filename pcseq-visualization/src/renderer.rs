//! Renderer contract and scoped window ownership

use crate::camera::Camera;
use log::debug;
use pcseq_core::{Point3f, Result, Rgb};
use std::ops::{Deref, DerefMut};

/// A window showing one mutable point cloud scene
pub trait SceneRenderer {
    /// Replace the displayed points and their colors (same length)
    fn update_geometry(&mut self, points: &[Point3f], colors: &[Rgb]) -> Result<()>;

    /// Fit the view to the current scene
    fn reset_view(&mut self) -> Result<()>;

    /// Handle pending window events and draw once.
    ///
    /// Returns `false` once the user has closed the window.
    fn render_tick(&mut self) -> Result<bool>;

    /// Release the window and its resources
    fn close(&mut self);
}

impl<R: SceneRenderer + ?Sized> SceneRenderer for &mut R {
    fn update_geometry(&mut self, points: &[Point3f], colors: &[Rgb]) -> Result<()> {
        (**self).update_geometry(points, colors)
    }

    fn reset_view(&mut self) -> Result<()> {
        (**self).reset_view()
    }

    fn render_tick(&mut self) -> Result<bool> {
        (**self).render_tick()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Owns a renderer for the length of a playback and closes it on drop,
/// whichever way the playback ends.
pub struct RenderWindow<R: SceneRenderer> {
    renderer: R,
    open: bool,
}

impl<R: SceneRenderer> RenderWindow<R> {
    pub fn open(renderer: R) -> Self {
        Self {
            renderer,
            open: true,
        }
    }

    /// Close now instead of at drop
    pub fn close(&mut self) {
        if self.open {
            self.open = false;
            self.renderer.close();
        }
    }
}

impl<R: SceneRenderer> Deref for RenderWindow<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.renderer
    }
}

impl<R: SceneRenderer> DerefMut for RenderWindow<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

impl<R: SceneRenderer> Drop for RenderWindow<R> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Renderer without a window.
///
/// Keeps the scene buffers and a camera so playback can run in a terminal;
/// each tick logs what would be drawn.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    points: Vec<Point3f>,
    colors: Vec<Rgb>,
    camera: Camera,
    ticks: usize,
    closed: bool,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera access, standing in for user interaction
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn points(&self) -> &[Point3f] {
        &self.points
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl SceneRenderer for HeadlessRenderer {
    fn update_geometry(&mut self, points: &[Point3f], colors: &[Rgb]) -> Result<()> {
        if points.len() != colors.len() {
            return Err(pcseq_core::Error::Render(format!(
                "{} colors for {} points",
                colors.len(),
                points.len()
            )));
        }
        self.points.clear();
        self.points.extend_from_slice(points);
        self.colors.clear();
        self.colors.extend_from_slice(colors);
        Ok(())
    }

    fn reset_view(&mut self) -> Result<()> {
        self.camera.fit(self.points.as_slice());
        Ok(())
    }

    fn render_tick(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        self.ticks += 1;
        debug!(
            "tick {}: {} points, camera at {:?} looking at {:?}",
            self.ticks,
            self.points.len(),
            self.camera.position,
            self.camera.target
        );
        Ok(true)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_closes_on_drop() {
        let mut renderer = HeadlessRenderer::new();
        {
            let mut window = RenderWindow::open(&mut renderer);
            assert!(window.render_tick().unwrap());
        }
        assert!(renderer.is_closed());
        assert_eq!(renderer.ticks(), 1);
        assert!(!renderer.render_tick().unwrap());
    }

    #[test]
    fn test_user_camera_survives_geometry_updates() {
        let mut renderer = HeadlessRenderer::new();
        renderer
            .update_geometry(&[Point3f::origin(), Point3f::new(2.0, 2.0, 2.0)], &[[0.5; 3]; 2])
            .unwrap();
        renderer.reset_view().unwrap();

        renderer.camera_mut().position = Point3f::new(-4.0, 1.0, 9.0);
        let moved = renderer.camera().clone();

        renderer
            .update_geometry(&[Point3f::new(100.0, 0.0, 0.0)], &[[0.5; 3]])
            .unwrap();
        assert!(renderer.render_tick().unwrap());
        assert_eq!(renderer.camera(), &moved);
    }

    #[test]
    fn test_mismatched_buffers_rejected() {
        let mut renderer = HeadlessRenderer::new();
        let err = renderer
            .update_geometry(&[Point3f::origin()], &[])
            .unwrap_err();
        assert!(matches!(err, pcseq_core::Error::Render(_)));
    }
}
