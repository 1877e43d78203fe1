//! Codec boundary for point cloud frames
//!
//! The batch pipeline only talks to a [`Codec`]; any geometry compression
//! backend can sit behind it. [`QuantizedCodec`] is the bundled backend.

pub mod quantized;

pub use quantized::QuantizedCodec;

use pcseq_core::{CompressionParams, EncodedFrame, PointCloudFrame, Result};

/// Encode/decode capability for single frames.
///
/// Calls are independent of each other; a codec keeps no state between
/// frames, so one instance can be shared across threads.
pub trait Codec: Send + Sync {
    /// Extension (without the dot) of files holding encoded frames
    fn extension(&self) -> &'static str;

    /// Compress one frame. Fails with `Error::Encode`.
    fn encode(&self, frame: PointCloudFrame, params: &CompressionParams) -> Result<EncodedFrame>;

    /// Restore a frame from bytes produced by `encode`. Fails with `Error::Decode`.
    fn decode(&self, bytes: &[u8]) -> Result<PointCloudFrame>;
}

impl<C: Codec + ?Sized> Codec for &C {
    fn extension(&self) -> &'static str {
        (**self).extension()
    }

    fn encode(&self, frame: PointCloudFrame, params: &CompressionParams) -> Result<EncodedFrame> {
        (**self).encode(frame, params)
    }

    fn decode(&self, bytes: &[u8]) -> Result<PointCloudFrame> {
        (**self).decode(bytes)
    }
}

impl<C: Codec + ?Sized> Codec for Box<C> {
    fn extension(&self) -> &'static str {
        (**self).extension()
    }

    fn encode(&self, frame: PointCloudFrame, params: &CompressionParams) -> Result<EncodedFrame> {
        (**self).encode(frame, params)
    }

    fn decode(&self, bytes: &[u8]) -> Result<PointCloudFrame> {
        (**self).decode(bytes)
    }
}
