pub mod engine;
pub mod region;
pub mod tesseract;

pub use engine::{OcrEngine, OcrError, OcrInput, OcrOutput};
pub use region::{BoundingBox, TextRegion};
pub use tesseract::{TesseractOcrEngine, TesseractOptions};
