//! Compression parameters shared by every codec backend

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Lowest and highest accepted quantization precision
pub const QUANTIZATION_BITS_RANGE: std::ops::RangeInclusive<u8> = 1..=30;

/// Lowest and highest accepted encoder effort
pub const COMPRESSION_LEVEL_RANGE: std::ops::RangeInclusive<u8> = 0..=10;

/// Parameters for one compression run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionParams {
    /// Bits per coordinate axis; higher keeps more precision
    pub quantization_bits: u8,
    /// Encoder effort; higher trades time for smaller output
    pub compression_level: u8,
}

impl CompressionParams {
    pub fn new(quantization_bits: u8, compression_level: u8) -> Self {
        Self {
            quantization_bits,
            compression_level,
        }
    }

    /// Check both values against their accepted ranges
    pub fn validate(&self) -> Result<()> {
        if !QUANTIZATION_BITS_RANGE.contains(&self.quantization_bits) {
            return Err(Error::InvalidParams(format!(
                "quantization bits must be in {:?}, got {}",
                QUANTIZATION_BITS_RANGE, self.quantization_bits
            )));
        }
        if !COMPRESSION_LEVEL_RANGE.contains(&self.compression_level) {
            return Err(Error::InvalidParams(format!(
                "compression level must be in {:?}, got {}",
                COMPRESSION_LEVEL_RANGE, self.compression_level
            )));
        }
        Ok(())
    }
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self::new(8, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = CompressionParams::default();
        assert_eq!(params.quantization_bits, 8);
        assert_eq!(params.compression_level, 10);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_out_of_range() {
        assert!(CompressionParams::new(0, 5).validate().is_err());
        assert!(CompressionParams::new(31, 5).validate().is_err());
        assert!(CompressionParams::new(8, 11).validate().is_err());
        assert!(CompressionParams::new(30, 0).validate().is_ok());
    }
}
