//! On-screen renderer backed by kiss3d

use crate::camera::Camera;
use crate::renderer::SceneRenderer;
use kiss3d::camera::ArcBall;
use kiss3d::light::Light;
use kiss3d::nalgebra as kna;
use kiss3d::window::Window;
use log::debug;
use pcseq_core::{Error, Point3f, Result, Rgb};

/// Window settings for on-screen playback
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub point_size: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "pcseq player".to_string(),
            width: 1280,
            height: 720,
            point_size: 2.0,
        }
    }
}

fn to_kiss(p: &Point3f) -> kna::Point3<f32> {
    kna::Point3::new(p.x, p.y, p.z)
}

/// Draws the current frame in a kiss3d window with an arc-ball camera
pub struct WindowRenderer {
    window: Window,
    arc_ball: ArcBall,
    fit: Camera,
    points: Vec<Point3f>,
    colors: Vec<kna::Point3<f32>>,
}

impl WindowRenderer {
    /// Open the window; must be called from the main thread
    pub fn open(config: &WindowConfig) -> Self {
        let mut window = Window::new_with_size(&config.title, config.width, config.height);
        window.set_light(Light::StickToCamera);
        window.set_point_size(config.point_size);

        let fit = Camera::default();
        let arc_ball = ArcBall::new(to_kiss(&fit.position), to_kiss(&fit.target));
        Self {
            window,
            arc_ball,
            fit,
            points: Vec::new(),
            colors: Vec::new(),
        }
    }
}

impl SceneRenderer for WindowRenderer {
    fn update_geometry(&mut self, points: &[Point3f], colors: &[Rgb]) -> Result<()> {
        if points.len() != colors.len() {
            return Err(Error::Render(format!(
                "{} colors for {} points",
                colors.len(),
                points.len()
            )));
        }
        self.points.clear();
        self.points.extend_from_slice(points);
        self.colors.clear();
        self.colors
            .extend(colors.iter().map(|c| kna::Point3::new(c[0], c[1], c[2])));
        Ok(())
    }

    fn reset_view(&mut self) -> Result<()> {
        self.fit.fit(self.points.as_slice());
        self.arc_ball
            .look_at(to_kiss(&self.fit.position), to_kiss(&self.fit.target));
        debug!("view fitted, distance {}", self.fit.distance());
        Ok(())
    }

    fn render_tick(&mut self) -> Result<bool> {
        for (point, color) in self.points.iter().zip(&self.colors) {
            self.window.draw_point(&to_kiss(point), color);
        }
        Ok(self.window.render_with_camera(&mut self.arc_ball))
    }

    fn close(&mut self) {
        self.window.close();
    }
}
