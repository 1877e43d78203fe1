//! Visualization and playback for point cloud sequences
//!
//! This crate plays uncompressed frames in order through a renderer:
//! - Renderer contract and scoped window handling
//! - Fixed-cadence playback with cancellation
//! - Camera fitting
//! - A headless renderer for terminals and tests
//! - An on-screen kiss3d renderer (`window` feature)

pub mod camera;
pub mod player;
pub mod renderer;
#[cfg(feature = "window")]
pub mod window;

pub use camera::*;
pub use player::*;
pub use renderer::*;
#[cfg(feature = "window")]
pub use window::*;
