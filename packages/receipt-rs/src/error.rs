//! Error type shared by the library modules.
use std::path::PathBuf;

use receipt_ocr::OcrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiptError {
    /// An expected artifact (weights, image, label directory, checkout) is missing.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`{command}` failed:\n{output}")]
    Process { command: String, output: String },
}

pub type Result<T> = std::result::Result<T, ReceiptError>;
