//! OCR backend that shells out to the `tesseract` command line tool and reads
//! its TSV report.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::engine::{OcrEngine, OcrError, OcrInput, OcrOutput};
use crate::region::{BoundingBox, TextRegion};

/// Tesseract TSV level for a single word.
const WORD_LEVEL: &str = "5";

#[derive(Debug, Clone)]
pub struct TesseractOptions {
    pub binary: PathBuf,
    pub language: String,
    /// `--psm` value; `None` leaves tesseract's default.
    pub page_segmentation_mode: Option<u8>,
}

impl Default for TesseractOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            // Crops are small single blocks of text.
            page_segmentation_mode: Some(6),
        }
    }
}

pub struct TesseractOcrEngine {
    options: TesseractOptions,
}

impl TesseractOcrEngine {
    pub fn new() -> Self {
        Self::with_options(TesseractOptions::default())
    }

    pub fn with_options(options: TesseractOptions) -> Self {
        Self { options }
    }

    async fn run_tsv(&self, image: &Path) -> Result<String, OcrError> {
        let mut cmd = Command::new(&self.options.binary);
        cmd.arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.options.language);
        if let Some(psm) = self.options.page_segmentation_mode {
            cmd.arg("--psm").arg(psm.to_string());
        }
        cmd.arg("tsv");

        let output = cmd.output().await.map_err(|e| {
            OcrError::EngineError(format!(
                "failed to run {}: {}",
                self.options.binary.display(),
                e
            ))
        })?;

        if !output.status.success() {
            return Err(OcrError::EngineError(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        String::from_utf8(output.stdout).map_err(|e| OcrError::EngineError(e.to_string()))
    }
}

impl Default for TesseractOcrEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct LineAccumulator {
    key: (String, String, String, String),
    words: Vec<String>,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    confidence_sum: f32,
}

impl LineAccumulator {
    fn into_region(self) -> TextRegion {
        let count = self.words.len() as f32;
        TextRegion {
            text: self.words.join(" "),
            bounding_box: Some(BoundingBox {
                x: self.left,
                y: self.top,
                width: self.right - self.left,
                height: self.bottom - self.top,
            }),
            confidence: Some(self.confidence_sum / count / 100.0),
        }
    }
}

/// Groups the word rows of a tesseract TSV report into line regions.
///
/// Rows with negative confidence or blank text are ignored; lines keep the
/// order tesseract emitted them in.
pub fn parse_tsv(tsv: &str) -> Vec<TextRegion> {
    let mut lines: Vec<LineAccumulator> = Vec::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != WORD_LEVEL {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }
        let parsed = (
            cols[6].parse::<f32>(),
            cols[7].parse::<f32>(),
            cols[8].parse::<f32>(),
            cols[9].parse::<f32>(),
            cols[10].parse::<f32>(),
        );
        let (Ok(left), Ok(top), Ok(width), Ok(height), Ok(conf)) = parsed else {
            continue;
        };
        if conf < 0.0 {
            continue;
        }

        let key = (
            cols[1].to_string(),
            cols[2].to_string(),
            cols[3].to_string(),
            cols[4].to_string(),
        );
        match lines.last_mut() {
            Some(line) if line.key == key => {
                line.words.push(text.to_string());
                line.left = line.left.min(left);
                line.top = line.top.min(top);
                line.right = line.right.max(left + width);
                line.bottom = line.bottom.max(top + height);
                line.confidence_sum += conf;
            }
            _ => lines.push(LineAccumulator {
                key,
                words: vec![text.to_string()],
                left,
                top,
                right: left + width,
                bottom: top + height,
                confidence_sum: conf,
            }),
        }
    }

    lines.into_iter().map(LineAccumulator::into_region).collect()
}

fn build_output(regions: Vec<TextRegion>) -> OcrOutput {
    let text = regions
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    OcrOutput { text, regions }
}

#[async_trait]
impl OcrEngine for TesseractOcrEngine {
    async fn recognize(&self, input: &OcrInput) -> Result<OcrOutput, OcrError> {
        let tsv = match input {
            OcrInput::FilePath(path) => {
                if !path.exists() {
                    return Err(OcrError::InvalidInput(format!(
                        "{} does not exist",
                        path.display()
                    )));
                }
                self.run_tsv(path).await?
            }
            OcrInput::Bytes(data) => {
                if data.is_empty() {
                    return Err(OcrError::InvalidInput("empty image buffer".to_string()));
                }
                let file = tempfile::Builder::new()
                    .prefix("receipt-ocr-")
                    .tempfile()
                    .map_err(|e| OcrError::EngineError(e.to_string()))?;
                tokio::fs::write(file.path(), data)
                    .await
                    .map_err(|e| OcrError::EngineError(e.to_string()))?;
                self.run_tsv(file.path()).await?
            }
        };

        let regions = parse_tsv(&tsv);
        debug!(regions = regions.len(), "tesseract finished");
        Ok(build_output(regions))
    }
}
