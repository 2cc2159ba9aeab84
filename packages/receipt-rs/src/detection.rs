//! Decoding of detector label files into pixel-space detections.
//!
//! A label file holds one detection per line:
//!
//! ```text
//! <class_id> <cx> <cy> <w> <h> [<confidence>]
//! ```
//!
//! where the four box values are normalized to the image size.
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classes::ClassList;
use crate::error::Result;

/// Pixel box with inclusive corners, clamped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelBox {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn mid_y(&self) -> f32 {
        (self.y1 as f32 + self.y2 as f32) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: usize,
    pub class_name: String,
    pub bbox: PixelBox,
    pub confidence: f32,
}

/// Why a label line did not produce a detection.
#[derive(Debug, Clone, PartialEq)]
pub enum SkippedLine {
    TooFewFields(usize),
    InvalidNumber(String),
    UnknownClass(usize),
}

/// Decodes one label line against an image of `width` x `height` pixels.
pub fn decode_label_line(
    line: &str,
    width: u32,
    height: u32,
    classes: &ClassList,
) -> std::result::Result<Detection, SkippedLine> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return Err(SkippedLine::TooFewFields(parts.len()));
    }

    let class_id: usize = parts[0]
        .parse()
        .map_err(|_| SkippedLine::InvalidNumber(parts[0].to_string()))?;
    let mut coords = [0f64; 4];
    for (slot, raw) in coords.iter_mut().zip(&parts[1..5]) {
        *slot = raw
            .parse()
            .map_err(|_| SkippedLine::InvalidNumber(raw.to_string()))?;
    }
    let confidence = match parts.get(5) {
        Some(raw) => raw
            .parse::<f32>()
            .map_err(|_| SkippedLine::InvalidNumber(raw.to_string()))?,
        None => 0.0,
    };

    let class_name = classes
        .name(class_id)
        .ok_or(SkippedLine::UnknownClass(class_id))?
        .to_string();

    let (w, h) = (width as f64, height as f64);
    let cx = coords[0] * w;
    let cy = coords[1] * h;
    let bw = coords[2] * w;
    let bh = coords[3] * h;

    // `as u32` truncates toward zero and saturates negatives at 0.
    let bbox = PixelBox {
        x1: (cx - bw / 2.0).max(0.0) as u32,
        y1: (cy - bh / 2.0).max(0.0) as u32,
        x2: (cx + bw / 2.0).min(w - 1.0) as u32,
        y2: (cy + bh / 2.0).min(h - 1.0) as u32,
    };

    Ok(Detection {
        class_id,
        class_name,
        bbox,
        confidence,
    })
}

/// Decodes every line of a label file, skipping malformed lines.
pub fn parse_label_file(
    contents: &str,
    width: u32,
    height: u32,
    classes: &ClassList,
) -> Vec<Detection> {
    let mut detections = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match decode_label_line(line, width, height, classes) {
            Ok(detection) => detections.push(detection),
            Err(SkippedLine::UnknownClass(id)) => {
                warn!(line = idx + 1, class_id = id, "class id outside class list, skipping");
            }
            Err(reason) => {
                debug!(line = idx + 1, ?reason, "malformed label line, skipping");
            }
        }
    }
    detections
}

pub fn read_label_file(
    path: &Path,
    width: u32,
    height: u32,
    classes: &ClassList,
) -> Result<Vec<Detection>> {
    let contents = std::fs::read_to_string(path)?;
    let detections = parse_label_file(&contents, width, height, classes);
    debug!(
        file = %path.display(),
        detections = detections.len(),
        "decoded label file"
    );
    Ok(detections)
}
