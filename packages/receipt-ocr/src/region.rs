/// Axis-aligned box in the pixel space of the recognized image.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One recognized line of text.
#[derive(Debug, Clone)]
pub struct TextRegion {
    pub text: String,
    pub bounding_box: Option<BoundingBox>,
    /// Normalized to `0.0..=1.0`.
    pub confidence: Option<f32>,
}
