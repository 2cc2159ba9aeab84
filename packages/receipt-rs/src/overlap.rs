//! Vertical overlap scoring between detections on the same receipt row.
use crate::detection::PixelBox;

/// Intersection over union of the y-extents of `a` and `b`.
///
/// Horizontal placement is ignored. Returns 0.0 when the union is empty.
pub fn vertical_iou(a: &PixelBox, b: &PixelBox) -> f32 {
    let (ay1, ay2) = (a.y1 as i64, a.y2 as i64);
    let (by1, by2) = (b.y1 as i64, b.y2 as i64);

    let inter = (ay2.min(by2) - ay1.max(by1)).max(0);
    let union = (ay2 - ay1) + (by2 - by1) - inter;
    if union > 0 {
        inter as f32 / union as f32
    } else {
        0.0
    }
}
