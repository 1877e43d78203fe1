//! Camera utilities for 3D visualization

use nalgebra::{Point3, Vector3};
use pcseq_core::Drawable;

/// A 3D camera for viewing point clouds
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Aim at the center of `scene` from far enough back to see all of it.
    ///
    /// Keeps the current viewing direction; an empty or single-point scene
    /// gets a unit radius.
    pub fn fit<D: Drawable + ?Sized>(&mut self, scene: &D) {
        let (min, max) = scene.bounding_box();
        let center = scene.center();
        let radius = (max - min).norm() * 0.5;
        let radius = if radius > 1.0e-3 { radius } else { 1.0 };

        let direction = (self.position - self.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);
        let distance = radius / (self.fov * 0.5).sin();

        self.target = center;
        self.position = center + direction * distance;
        self.near = (distance - radius).max(distance * 1.0e-3);
        self.far = distance + radius * 2.0;
    }

    /// Distance from the camera to its target
    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            std::f32::consts::FRAC_PI_4,
            16.0 / 9.0,
            0.1,
            100.0,
        )
    }
}
