//! PLY format support

use crate::{FrameReader, FrameWriter};
use log::debug;
use pcseq_core::{Error, Point3f, PointCloudFrame, Result};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub struct PlyReader;
pub struct PlyWriter;

const COLOR_CHANNELS: [&str; 3] = ["red", "green", "blue"];

impl FrameReader for PlyReader {
    fn read_frame<P: AsRef<Path>>(path: P) -> Result<PointCloudFrame> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::frame_read(path, e))?;
        let mut reader = BufReader::new(file);

        let parser = Parser::<DefaultElement>::new();
        let ply = parser
            .read_ply(&mut reader)
            .map_err(|e| Error::frame_read(path, e))?;

        let frame = frame_from_ply(&ply).map_err(|e| Error::frame_read(path, e))?;
        debug!(
            "read {} points (colors: {}) from {}",
            frame.len(),
            frame.has_colors(),
            path.display()
        );
        Ok(frame)
    }
}

fn frame_from_ply(ply: &Ply<DefaultElement>) -> Result<PointCloudFrame> {
    let Some(vertices) = ply.payload.get("vertex") else {
        return Ok(PointCloudFrame::default());
    };

    let has_colors = vertices
        .first()
        .map(|v| v.contains_key(COLOR_CHANNELS[0]))
        .unwrap_or(false);

    let mut points = Vec::with_capacity(vertices.len());
    let mut colors = Vec::with_capacity(if has_colors { vertices.len() } else { 0 });

    for vertex in vertices {
        let x = extract_property_value(vertex, "x")?;
        let y = extract_property_value(vertex, "y")?;
        let z = extract_property_value(vertex, "z")?;
        points.push(Point3f::new(x, y, z));

        if has_colors {
            colors.push([
                extract_color_channel(vertex, COLOR_CHANNELS[0])?,
                extract_color_channel(vertex, COLOR_CHANNELS[1])?,
                extract_color_channel(vertex, COLOR_CHANNELS[2])?,
            ]);
        }
    }

    PointCloudFrame::new(points, has_colors.then_some(colors))
}

impl FrameWriter for PlyWriter {
    fn write_frame<P: AsRef<Path>>(frame: &PointCloudFrame, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut ply = frame_to_ply(frame);

        let file = File::create(path).map_err(|e| Error::frame_write(path, e))?;
        let mut writer = BufWriter::new(file);

        let writer_instance = Writer::new();
        writer_instance
            .write_ply(&mut writer, &mut ply)
            .and_then(|_| writer.flush())
            .map_err(|e| Error::frame_write(path, e))?;

        Ok(())
    }
}

fn frame_to_ply(frame: &PointCloudFrame) -> Ply<DefaultElement> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header.comments.push("generated by pcseq".to_string());

    // Define vertex element
    let mut vertex_element = ElementDef::new("vertex".to_string());
    vertex_element.count = frame.len();
    for axis in ["x", "y", "z"] {
        vertex_element.properties.add(PropertyDef::new(
            axis.to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));
    }
    if frame.has_colors() {
        for channel in COLOR_CHANNELS {
            vertex_element.properties.add(PropertyDef::new(
                channel.to_string(),
                PropertyType::Scalar(ScalarType::UChar),
            ));
        }
    }
    ply.header.elements.add(vertex_element);

    // Add vertex data
    let colors = frame.colors_u8();
    let mut vertices = Vec::with_capacity(frame.len());
    for (i, point) in frame.points().iter().enumerate() {
        let mut vertex = DefaultElement::new();
        vertex.insert("x".to_string(), Property::Float(point.x));
        vertex.insert("y".to_string(), Property::Float(point.y));
        vertex.insert("z".to_string(), Property::Float(point.z));
        if let Some(colors) = &colors {
            for (channel, value) in COLOR_CHANNELS.iter().zip(colors[i]) {
                vertex.insert(channel.to_string(), Property::UChar(value));
            }
        }
        vertices.push(vertex);
    }
    ply.payload.insert("vertex".to_string(), vertices);

    ply
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        Some(Property::Short(val)) => Ok(*val as f32),
        Some(Property::UShort(val)) => Ok(*val as f32),
        _ => Err(Error::InvalidData(format!(
            "Property '{}' not found or invalid type",
            name
        ))),
    }
}

/// Extract a color channel normalized to [0, 1].
///
/// Integer channels are 8-bit; float channels are taken as already normalized.
fn extract_color_channel(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::UChar(val)) => Ok(*val as f32 / 255.0),
        Some(Property::Char(val)) => Ok((*val).max(0) as f32 / 255.0),
        Some(Property::UShort(val)) => Ok((*val).min(255) as f32 / 255.0),
        Some(Property::Int(val)) => Ok((*val).clamp(0, 255) as f32 / 255.0),
        Some(Property::UInt(val)) => Ok((*val).min(255) as f32 / 255.0),
        Some(Property::Float(val)) => Ok(val.clamp(0.0, 1.0)),
        Some(Property::Double(val)) => Ok(val.clamp(0.0, 1.0) as f32),
        _ => Err(Error::InvalidData(format!(
            "Color channel '{}' missing on a colored vertex",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_declares_colors_only_when_present() {
        let plain = PointCloudFrame::from_points(vec![Point3f::origin()]);
        let ply = frame_to_ply(&plain);
        let vertex = ply.header.elements.get("vertex").unwrap();
        assert_eq!(vertex.properties.len(), 3);
        assert!(matches!(ply.header.encoding, Encoding::Ascii));

        let colored =
            PointCloudFrame::new(vec![Point3f::origin()], Some(vec![[1.0, 0.0, 0.5]])).unwrap();
        let ply = frame_to_ply(&colored);
        let vertex = ply.header.elements.get("vertex").unwrap();
        assert_eq!(vertex.properties.len(), 6);
        let first = &ply.payload.get("vertex").unwrap()[0];
        assert!(matches!(first.get("blue"), Some(Property::UChar(128))));
    }

    #[test]
    fn test_missing_vertex_element_is_empty_frame() {
        let ply = Ply::<DefaultElement>::new();
        let frame = frame_from_ply(&ply).unwrap();
        assert!(frame.is_empty());
        assert!(!frame.has_colors());
    }
}
