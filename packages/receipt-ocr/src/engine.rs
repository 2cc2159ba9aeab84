use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::region::TextRegion;

/// Image handed to an OCR engine, either on disk or already encoded in memory.
#[derive(Debug, Clone)]
pub enum OcrInput {
    FilePath(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    pub text: String,
    pub regions: Vec<TextRegion>,
}

impl OcrOutput {
    /// Region texts joined by single spaces, with the ends trimmed. Spacing
    /// inside a region is kept. Falls back to the trimmed raw text when the
    /// engine reported no regions.
    pub fn joined_text(&self) -> String {
        if self.regions.is_empty() {
            return self.text.trim().to_string();
        }
        self.regions
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("unsupported operation")]
    Unsupported,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("engine error: {0}")]
    EngineError(String),
}

#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, input: &OcrInput) -> Result<OcrOutput, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(text: &str) -> TextRegion {
        TextRegion {
            text: text.to_string(),
            bounding_box: None,
            confidence: None,
        }
    }

    #[test]
    fn test_joined_text_uses_regions() {
        let output = OcrOutput {
            text: "ignored".to_string(),
            regions: vec![region(" ACME  Corp"), region("Ltd. ")],
        };
        assert_eq!(output.joined_text(), "ACME  Corp Ltd.");
    }

    #[test]
    fn test_joined_text_falls_back_to_text() {
        let output = OcrOutput {
            text: "  12.50 EUR\n".to_string(),
            regions: vec![],
        };
        assert_eq!(output.joined_text(), "12.50 EUR");
    }

    #[test]
    fn test_joined_text_empty() {
        assert_eq!(OcrOutput::default().joined_text(), "");
    }
}
