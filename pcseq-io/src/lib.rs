//! I/O operations for point cloud frames
//!
//! Frames are stored as PLY files. Reading accepts ASCII and binary PLY;
//! writing always produces ASCII so decoded frames stay human-readable.

pub mod ply;

pub use ply::{PlyReader, PlyWriter};

use pcseq_core::{PointCloudFrame, Result};
use std::path::Path;

/// Extension of uncompressed frame files
pub const FRAME_EXTENSION: &str = "ply";

/// Trait for reading frames from files
pub trait FrameReader {
    fn read_frame<P: AsRef<Path>>(path: P) -> Result<PointCloudFrame>;
}

/// Trait for writing frames to files
pub trait FrameWriter {
    fn write_frame<P: AsRef<Path>>(frame: &PointCloudFrame, path: P) -> Result<()>;
}

/// Read a PLY frame
pub fn read_frame<P: AsRef<Path>>(path: P) -> Result<PointCloudFrame> {
    PlyReader::read_frame(path)
}

/// Write a frame as ASCII PLY
pub fn write_frame<P: AsRef<Path>>(frame: &PointCloudFrame, path: P) -> Result<()> {
    PlyWriter::write_frame(frame, path)
}
