//! Point cloud frame data structures and color unit conversions

use crate::{Error, Point3f, Result};

/// Normalized RGB color, each channel in [0, 1]
pub type Rgb = [f32; 3];

/// Convert a normalized color to its 8-bit wire form
pub fn color_to_u8(color: Rgb) -> [u8; 3] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Convert an 8-bit wire color to its normalized form
pub fn color_from_u8(color: [u8; 3]) -> Rgb {
    color.map(|c| c as f32 / 255.0)
}

/// Build normalized colors from an interleaved 8-bit buffer.
///
/// Only the first three channels of every point are used; anything beyond
/// (alpha, for example) is ignored.
pub fn colors_from_channels(data: &[u8], channels: usize) -> Result<Vec<Rgb>> {
    if channels < 3 {
        return Err(Error::InvalidData(format!(
            "color needs at least 3 channels, got {}",
            channels
        )));
    }
    if data.len() % channels != 0 {
        return Err(Error::InvalidData(format!(
            "color buffer of {} bytes is not a multiple of {} channels",
            data.len(),
            channels
        )));
    }
    Ok(data
        .chunks_exact(channels)
        .map(|c| color_from_u8([c[0], c[1], c[2]]))
        .collect())
}

/// One frame of a point cloud sequence.
///
/// Colors are either present for every point or absent for the whole frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloudFrame {
    points: Vec<Point3f>,
    colors: Option<Vec<Rgb>>,
}

impl PointCloudFrame {
    /// Create a frame, checking that colors (if any) match the point count
    pub fn new(points: Vec<Point3f>, colors: Option<Vec<Rgb>>) -> Result<Self> {
        if let Some(colors) = &colors {
            if colors.len() != points.len() {
                return Err(Error::InvalidData(format!(
                    "{} colors for {} points",
                    colors.len(),
                    points.len()
                )));
            }
        }
        Ok(Self { points, colors })
    }

    /// Create an uncolored frame
    pub fn from_points(points: Vec<Point3f>) -> Self {
        Self { points, colors: None }
    }

    /// Create a frame from 8-bit wire colors
    pub fn from_u8_colors(points: Vec<Point3f>, colors: Option<Vec<[u8; 3]>>) -> Result<Self> {
        let colors = colors.map(|c| c.into_iter().map(color_from_u8).collect());
        Self::new(points, colors)
    }

    pub fn points(&self) -> &[Point3f] {
        &self.points
    }

    pub fn colors(&self) -> Option<&[Rgb]> {
        self.colors.as_deref()
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    /// Colors converted to the 8-bit wire form
    pub fn colors_u8(&self) -> Option<Vec<[u8; 3]>> {
        self.colors
            .as_ref()
            .map(|c| c.iter().copied().map(color_to_u8).collect())
    }

    /// Colors for display, broadcasting `fallback` when the frame has none
    pub fn colors_or(&self, fallback: Rgb) -> Vec<Rgb> {
        match &self.colors {
            Some(colors) => colors.clone(),
            None => vec![fallback; self.points.len()],
        }
    }

    /// Get the number of points in the frame
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the frame has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
