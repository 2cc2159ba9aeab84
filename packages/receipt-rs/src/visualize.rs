//! Debug rendering of detections on top of the source image.
use std::path::Path;

use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::debug;

use crate::detection::Detection;
use crate::error::Result;

const PALETTE: [Rgb<u8>; 6] = [
    Rgb([230, 25, 75]),
    Rgb([60, 180, 75]),
    Rgb([0, 130, 200]),
    Rgb([245, 130, 48]),
    Rgb([145, 30, 180]),
    Rgb([70, 240, 240]),
];

const TAG_SCALE: f32 = 16.0;
const TAG_PADDING: u32 = 3;
const TAG_TEXT: Rgb<u8> = Rgb([255, 255, 255]);

const FONT_PATHS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn class_color(class_id: usize) -> Rgb<u8> {
    PALETTE[class_id % PALETTE.len()]
}

/// First readable font from the usual system locations.
pub fn load_font() -> Option<FontVec> {
    let font = FONT_PATHS.iter().find_map(|path| {
        let data = std::fs::read(path).ok()?;
        FontVec::try_from_vec(data).ok()
    });
    if font.is_none() {
        debug!("no system font found, visualizations will carry no labels");
    }
    font
}

/// `"<class name> <confidence>"`, as printed in the tag above a box.
pub fn tag_text(det: &Detection) -> String {
    format!("{} {:.2}", det.class_name, det.confidence)
}

/// Filled tag with the class name and confidence, sitting on the top edge
/// of the box. Parts above the image are clipped.
fn draw_tag(canvas: &mut RgbImage, det: &Detection, font: &FontVec) {
    let label = tag_text(det);
    let (text_w, text_h) = text_size(TAG_SCALE, font, &label);
    let tag_w = text_w + 2 * TAG_PADDING;
    let tag_h = text_h + 2 * TAG_PADDING;
    let left = det.bbox.x1 as i32;
    let top = det.bbox.y1 as i32 - tag_h as i32;

    let color = class_color(det.class_id);
    draw_filled_rect_mut(canvas, Rect::at(left, top).of_size(tag_w, tag_h), color);
    draw_text_mut(
        canvas,
        TAG_TEXT,
        left + TAG_PADDING as i32,
        top + TAG_PADDING as i32,
        TAG_SCALE,
        font,
        &label,
    );
}

/// Copy of `image` with a 2px outline around every detection and, when a
/// font is given, a name/confidence tag above it.
pub fn draw_detections(image: &RgbImage, detections: &[Detection], font: Option<&FontVec>) -> RgbImage {
    let mut canvas = image.clone();
    for det in detections {
        let b = det.bbox;
        // box corners are inclusive
        let width = b.width() + 1;
        let height = b.height() + 1;
        let color = class_color(det.class_id);

        let outer = Rect::at(b.x1 as i32, b.y1 as i32).of_size(width, height);
        draw_hollow_rect_mut(&mut canvas, outer, color);
        if width > 2 && height > 2 {
            let inner = Rect::at(b.x1 as i32 + 1, b.y1 as i32 + 1).of_size(width - 2, height - 2);
            draw_hollow_rect_mut(&mut canvas, inner, color);
        }
        if let Some(font) = font {
            draw_tag(&mut canvas, det, font);
        }
    }
    canvas
}

/// Draws `detections` and writes the result to `path`; the format follows
/// the file extension.
pub fn save_visualization(
    path: &Path,
    image: &RgbImage,
    detections: &[Detection],
    font: Option<&FontVec>,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    draw_detections(image, detections, font).save(path)?;
    Ok(())
}
