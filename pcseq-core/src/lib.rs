//! Core data structures and traits for pcseq
//!
//! This crate provides the frame model shared by the codec, the batch
//! pipeline and the player: point cloud frames with optional colors,
//! compression parameters, the error taxonomy and ordered frame discovery.

pub mod error;
pub mod frame;
pub mod params;
pub mod source;
pub mod traits;

pub use error::*;
pub use frame::*;
pub use params::*;
pub use source::*;
pub use traits::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::Point3;

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// Opaque bytes produced by a codec's encode operation
pub type EncodedFrame = Vec<u8>;
