//! Ordered discovery of frame files in a directory

use crate::{Error, Result};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Digits(&'a str),
    Text(String),
}

fn segments(name: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (i, ch) in name.char_indices() {
        let digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(segment(&name[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(prev) = in_digits {
        out.push(segment(&name[start..], prev));
    }
    out
}

fn segment(run: &str, digits: bool) -> Segment<'_> {
    if digits {
        Segment::Digits(run)
    } else {
        Segment::Text(run.to_lowercase())
    }
}

/// Compare two digit runs by numeric value without parsing them
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_segment(a: &Segment<'_>, b: &Segment<'_>) -> Ordering {
    match (a, b) {
        (Segment::Digits(a), Segment::Digits(b)) => cmp_digits(a, b),
        (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
        // Numbers sort before words at the same position
        (Segment::Digits(_), Segment::Text(_)) => Ordering::Less,
        (Segment::Text(_), Segment::Digits(_)) => Ordering::Greater,
    }
}

/// Natural ("human") ordering of two file names.
///
/// Digit runs compare by value, other runs compare case-insensitively, and
/// a name whose segments are a prefix of another's sorts first. Names that
/// are equal under those rules fall back to a byte comparison.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let sa = segments(a);
    let sb = segments(b);
    sa.iter()
        .zip(sb.iter())
        .map(|(x, y)| cmp_segment(x, y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| sa.len().cmp(&sb.len()))
        .then_with(|| a.cmp(b))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Sort paths by the natural order of their file names
pub fn sort_naturally(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
}

/// A flat directory of frame files sharing one extension
#[derive(Debug, Clone)]
pub struct FrameSource {
    dir: PathBuf,
    extension: String,
}

impl FrameSource {
    /// `extension` is given without the leading dot and matched case-insensitively
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_lowercase(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Fail with `DirectoryNotFound` unless the directory exists
    pub fn ensure_exists(&self) -> Result<()> {
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(Error::DirectoryNotFound {
                path: self.dir.clone(),
            })
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    /// List matching regular files in natural order
    pub fn frames(&self) -> Result<Vec<PathBuf>> {
        self.ensure_exists()?;

        let mut frames = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && self.matches(&path) {
                frames.push(path);
            }
        }

        sort_naturally(&mut frames);
        Ok(frames)
    }
}
