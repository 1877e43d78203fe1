//! Core traits for pcseq

use crate::{Point3f, PointCloudFrame};

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }
}

impl Drawable for [Point3f] {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        let Some(first) = self.first() else {
            return (Point3f::origin(), Point3f::origin());
        };

        let mut min = *first;
        let mut max = *first;
        for p in self {
            min = min.inf(p);
            max = max.sup(p);
        }

        (min, max)
    }
}

impl Drawable for PointCloudFrame {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        self.points().bounding_box()
    }
}
