//! Bounding-box quantizing codec
//!
//! Coordinates are quantized per axis to `quantization_bits` inside the
//! frame's bounding box. The compression level picks the packing:
//!
//! - `0`: fixed 32-bit words, no entropy stage
//! - `1..=4`: fixed 32-bit words, LZ4
//! - `5..=10`: per-axis deltas as zigzag varints, LZ4
//!
//! Point order and count are preserved; colors travel as 8-bit RGB. The
//! bounding-box extent is kept in f64, since `max - min` can overflow f32
//! for finite coordinates.

use crate::Codec;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use pcseq_core::{
    colors_from_channels, CompressionParams, Drawable, EncodedFrame, Error, Point3f,
    PointCloudFrame, Result,
};
use std::borrow::Cow;
use std::io::{Cursor, Read};

const MAGIC: &[u8; 4] = b"PCQ1";
const VERSION: u8 = 1;
const FLAG_COLORS: u8 = 0b01;
const FLAG_LZ4: u8 = 0b10;
const RGB_CHANNELS: u8 = 3;

/// Levels at or above this use delta + varint packing
const DELTA_LEVEL: u8 = 5;

/// Header layout: magic, version, bits, level, flags, channels, count, min, extent
const HEADER_LEN: usize = 4 + 5 + 4 + 12 + 24;

/// Quantizing codec writing `.pcq` frames
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantizedCodec;

impl QuantizedCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for QuantizedCodec {
    fn extension(&self) -> &'static str {
        "pcq"
    }

    fn encode(&self, frame: PointCloudFrame, params: &CompressionParams) -> Result<EncodedFrame> {
        params.validate().map_err(|e| Error::Encode(e.to_string()))?;
        encode_frame(&frame, params)
    }

    fn decode(&self, bytes: &[u8]) -> Result<PointCloudFrame> {
        decode_frame(bytes)
    }
}

fn max_quantized(bits: u8) -> f64 {
    ((1u64 << bits) - 1) as f64
}

fn quantize(value: f32, min: f32, extent: f64, max_q: f64) -> u32 {
    if extent <= 0.0 {
        return 0;
    }
    let t = (value as f64 - min as f64) / extent;
    (t * max_q).round().clamp(0.0, max_q) as u32
}

fn dequantize(q: u32, min: f32, extent: f64, max_q: f64) -> f32 {
    if extent <= 0.0 {
        return min;
    }
    (min as f64 + q as f64 / max_q * extent) as f32
}

fn zigzag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn unzigzag(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

fn write_varint(out: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn read_varint(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        let byte = cursor
            .read_u8()
            .map_err(|_| Error::Decode("truncated coordinate stream".into()))?;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::Decode("varint longer than 64 bits".into()))
}

fn encode_frame(frame: &PointCloudFrame, params: &CompressionParams) -> Result<EncodedFrame> {
    if let Some(i) = frame
        .points()
        .iter()
        .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
    {
        return Err(Error::Encode(format!("point {} has a non-finite coordinate", i)));
    }
    let count = u32::try_from(frame.len())
        .map_err(|_| Error::Encode(format!("{} points exceed the format limit", frame.len())))?;

    let (min, max) = frame.bounding_box();
    let extent: [f64; 3] = std::array::from_fn(|axis| max[axis] as f64 - min[axis] as f64);
    let max_q = max_quantized(params.quantization_bits);

    let mut body = Vec::with_capacity(frame.len() * 4);
    let mut previous = [0i64; 3];
    for p in frame.points() {
        for axis in 0..3 {
            let q = quantize(p[axis], min[axis], extent[axis], max_q);
            if params.compression_level >= DELTA_LEVEL {
                write_varint(&mut body, zigzag(q as i64 - previous[axis]));
                previous[axis] = q as i64;
            } else {
                body.write_u32::<LittleEndian>(q)?;
            }
        }
    }
    if let Some(colors) = frame.colors_u8() {
        body.extend(colors.iter().flatten());
    }

    let mut flags = 0;
    if frame.has_colors() {
        flags |= FLAG_COLORS;
    }
    let body = if params.compression_level > 0 {
        flags |= FLAG_LZ4;
        lz4_flex::compress_prepend_size(&body)
    } else {
        body
    };

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(MAGIC);
    out.write_u8(VERSION)?;
    out.write_u8(params.quantization_bits)?;
    out.write_u8(params.compression_level)?;
    out.write_u8(flags)?;
    out.write_u8(if frame.has_colors() { RGB_CHANNELS } else { 0 })?;
    out.write_u32::<LittleEndian>(count)?;
    for axis in 0..3 {
        out.write_f32::<LittleEndian>(min[axis])?;
    }
    for axis in 0..3 {
        out.write_f64::<LittleEndian>(extent[axis])?;
    }
    out.extend_from_slice(&body);

    debug!(
        "encoded {} points at {} bits, level {} into {} bytes",
        count,
        params.quantization_bits,
        params.compression_level,
        out.len()
    );
    Ok(out)
}

struct Header {
    bits: u8,
    level: u8,
    flags: u8,
    channels: u8,
    count: usize,
    min: [f32; 3],
    extent: [f64; 3],
}

fn read_header(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Header> {
    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "not a pcq frame (bad magic)",
        ));
    }
    let version = cursor.read_u8()?;
    if version != VERSION {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unsupported pcq version {}", version),
        ));
    }
    let bits = cursor.read_u8()?;
    let level = cursor.read_u8()?;
    let flags = cursor.read_u8()?;
    let channels = cursor.read_u8()?;
    let count = cursor.read_u32::<LittleEndian>()? as usize;
    let mut min = [0f32; 3];
    let mut extent = [0f64; 3];
    for v in &mut min {
        *v = cursor.read_f32::<LittleEndian>()?;
    }
    for v in &mut extent {
        *v = cursor.read_f64::<LittleEndian>()?;
    }
    if extent.iter().any(|e| !e.is_finite()) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "non-finite bounding box",
        ));
    }
    Ok(Header {
        bits,
        level,
        flags,
        channels,
        count,
        min,
        extent,
    })
}

fn decode_frame(bytes: &[u8]) -> Result<PointCloudFrame> {
    let mut cursor = Cursor::new(bytes);
    let header = read_header(&mut cursor).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::Decode("truncated header".into()),
        _ => Error::Decode(e.to_string()),
    })?;
    if !pcseq_core::QUANTIZATION_BITS_RANGE.contains(&header.bits) {
        return Err(Error::Decode(format!("invalid quantization bits {}", header.bits)));
    }
    let has_colors = header.flags & FLAG_COLORS != 0;
    if has_colors && header.channels < RGB_CHANNELS {
        return Err(Error::Decode(format!("{} color channels", header.channels)));
    }

    let payload = &bytes[cursor.position() as usize..];
    let body: Cow<'_, [u8]> = if header.flags & FLAG_LZ4 != 0 {
        Cow::Owned(
            lz4_flex::decompress_size_prepended(payload)
                .map_err(|e| Error::Decode(format!("lz4: {}", e)))?,
        )
    } else {
        Cow::Borrowed(payload)
    };

    let max_q = max_quantized(header.bits);
    let mut cursor = Cursor::new(body.as_ref());
    let mut points = Vec::with_capacity(header.count.min(body.len()));
    let mut previous = [0i64; 3];
    for _ in 0..header.count {
        let mut q = [0u32; 3];
        for axis in 0..3 {
            let value = if header.level >= DELTA_LEVEL {
                previous[axis] = previous[axis].wrapping_add(unzigzag(read_varint(&mut cursor)?));
                previous[axis]
            } else {
                cursor
                    .read_u32::<LittleEndian>()
                    .map_err(|_| Error::Decode("truncated coordinate stream".into()))?
                    as i64
            };
            if value < 0 || value as f64 > max_q {
                return Err(Error::Decode(format!("coordinate {} out of range", value)));
            }
            q[axis] = value as u32;
        }
        points.push(Point3f::new(
            dequantize(q[0], header.min[0], header.extent[0], max_q),
            dequantize(q[1], header.min[1], header.extent[1], max_q),
            dequantize(q[2], header.min[2], header.extent[2], max_q),
        ));
    }

    let rest = &body[cursor.position() as usize..];
    let colors = if has_colors {
        let expected = header.count * header.channels as usize;
        if rest.len() != expected {
            return Err(Error::Decode(format!(
                "expected {} color bytes, found {}",
                expected,
                rest.len()
            )));
        }
        Some(
            colors_from_channels(rest, header.channels as usize)
                .map_err(|e| Error::Decode(e.to_string()))?,
        )
    } else {
        if !rest.is_empty() {
            return Err(Error::Decode(format!("{} trailing bytes", rest.len())));
        }
        None
    };

    PointCloudFrame::new(points, colors).map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(bits: u8, level: u8) -> CompressionParams {
        CompressionParams::new(bits, level)
    }

    fn sample_frame() -> PointCloudFrame {
        let points = (0..200)
            .map(|i| {
                let t = i as f32 * 0.05;
                Point3f::new(t.cos() * 2.0, t.sin() * 2.0, t * 0.1 - 0.5)
            })
            .collect();
        PointCloudFrame::from_points(points)
    }

    #[test]
    fn test_zigzag_roundtrip() {
        for v in [0i64, 1, -1, 63, -64, i32::MAX as i64, -(1 << 40)] {
            assert_eq!(unzigzag(zigzag(v)), v);
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = QuantizedCodec.encode(sample_frame(), &params(8, 0)).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(bytes[4], VERSION);
        assert_eq!(bytes[5], 8);
        assert_eq!(bytes[6], 0);
        assert_eq!(bytes[7] & FLAG_LZ4, 0);
        // 200 points * 3 axes * 4 bytes
        assert_eq!(bytes.len(), HEADER_LEN + 200 * 12);
    }

    #[test]
    fn test_delta_packing_is_smaller_on_smooth_paths() {
        let frame = sample_frame();
        let fixed = QuantizedCodec.encode(frame.clone(), &params(12, 0)).unwrap();
        let packed = QuantizedCodec.encode(frame, &params(12, 10)).unwrap();
        assert!(packed.len() < fixed.len());
    }

    #[test]
    fn test_rejects_non_finite() {
        let frame = PointCloudFrame::from_points(vec![Point3f::new(0.0, f32::NAN, 0.0)]);
        let err = QuantizedCodec.encode(frame, &params(8, 10)).unwrap_err();
        assert!(matches!(err, Error::Encode(ref m) if m.contains("non-finite")));
    }

    #[test]
    fn test_rejects_invalid_params() {
        let err = QuantizedCodec.encode(sample_frame(), &params(0, 10)).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(QuantizedCodec.decode(b""), Err(Error::Decode(_))));
        assert!(matches!(QuantizedCodec.decode(b"NOPE1234"), Err(Error::Decode(_))));

        let bytes = QuantizedCodec.encode(sample_frame(), &params(8, 3)).unwrap();
        let truncated = &bytes[..bytes.len() - 10];
        assert!(matches!(QuantizedCodec.decode(truncated), Err(Error::Decode(_))));

        let bytes = QuantizedCodec.encode(sample_frame(), &params(8, 0)).unwrap();
        assert!(matches!(
            QuantizedCodec.decode(&bytes[..HEADER_LEN + 5]),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_flat_axis_decodes_exactly() {
        let frame = PointCloudFrame::from_points(vec![
            Point3f::new(0.0, 7.5, 1.0),
            Point3f::new(1.0, 7.5, 2.0),
        ]);
        let bytes = QuantizedCodec.encode(frame, &params(4, 7)).unwrap();
        let decoded = QuantizedCodec.decode(&bytes).unwrap();
        assert!(decoded.points().iter().all(|p| p.y == 7.5));
    }
}
