//! End-to-end driver: training, single-image inference, and batch testing
//! over a directory with JSON (and optionally annotated image) output.
use std::path::{Path, PathBuf};

use image::RgbImage;
use receipt_ocr::OcrEngine;
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::classes::ClassList;
use crate::dataset::{validate_dataset, write_yaml};
use crate::detection::{read_label_file, Detection};
use crate::detector::Detector;
use crate::error::{ReceiptError, Result};
use crate::extractor::{RecordExtractor, StructuredRecord};
use crate::visualize::{load_font, save_visualization};

/// Image extensions searched when mapping a label file back to its image,
/// in priority order.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Trained detector weights used by `infer` and `test`.
    pub weights: PathBuf,
    /// Where `train` writes the dataset description.
    pub yaml_path: PathBuf,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            weights: PathBuf::from("yolov5/runs/train/receipt_det/weights/best.pt"),
            yaml_path: PathBuf::from("data/receipts.yaml"),
        }
    }
}

/// One processed image.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub image: RgbImage,
    pub detections: Vec<Detection>,
    pub record: StructuredRecord,
}

/// First image named `<stem>.<ext>` anywhere under `dir`.
pub fn find_image_by_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS.iter().find_map(|ext| {
        let wanted = format!("{}.{}", stem, ext);
        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| e.file_type().is_file() && e.file_name().to_str() == Some(wanted.as_str()))
            .map(|e| e.into_path())
    })
}

/// Any file directly inside `dir` whose stem is `stem`.
fn find_any_by_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.file_stem().and_then(|s| s.to_str()) == Some(stem))
        .collect();
    matches.sort();
    matches.into_iter().next()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct ReceiptPipeline<'a> {
    detector: &'a dyn Detector,
    ocr: &'a dyn OcrEngine,
    classes: ClassList,
    options: PipelineOptions,
}

impl<'a> ReceiptPipeline<'a> {
    pub fn new(
        detector: &'a dyn Detector,
        ocr: &'a dyn OcrEngine,
        classes: ClassList,
        options: PipelineOptions,
    ) -> Self {
        Self {
            detector,
            ocr,
            classes,
            options,
        }
    }

    /// Writes the dataset description for `dataset_root` and trains on it.
    pub async fn train(&self, dataset_root: &Path) -> Result<PathBuf> {
        let spec = write_yaml(dataset_root, &self.options.yaml_path, &self.classes)?;
        let weights = self.detector.train(&spec).await?;
        info!(weights = %weights.display(), "training finished");
        Ok(weights)
    }

    pub fn validate(&self, dataset_root: &Path) -> Vec<String> {
        validate_dataset(dataset_root, &self.classes)
    }

    fn require_weights(&self) -> Result<&Path> {
        let weights = self.options.weights.as_path();
        if !weights.exists() {
            return Err(ReceiptError::NotFound(weights.to_path_buf()));
        }
        Ok(weights)
    }

    /// Decodes `label_path` against `image_path` and extracts the record.
    /// Without a label file the image has no detections.
    pub async fn extract_image(
        &self,
        image_path: &Path,
        label_path: Option<&Path>,
    ) -> Result<Extraction> {
        if !image_path.is_file() {
            return Err(ReceiptError::NotFound(image_path.to_path_buf()));
        }
        let image = image::open(image_path)?.to_rgb8();
        let (width, height) = image.dimensions();

        let detections = match label_path {
            Some(labels) => read_label_file(labels, width, height, &self.classes)?,
            None => Vec::new(),
        };
        let record = RecordExtractor::new(self.ocr)
            .extract(&image, &detections)
            .await?;

        Ok(Extraction {
            image,
            detections,
            record,
        })
    }

    /// Detects and extracts a single image.
    pub async fn infer(&self, image_path: &Path) -> Result<StructuredRecord> {
        let weights = self.require_weights()?;
        if !image_path.is_file() {
            return Err(ReceiptError::NotFound(image_path.to_path_buf()));
        }

        let output = self.detector.detect(weights, image_path).await?;
        let label = output.label_for(&file_stem(image_path));
        if label.is_none() {
            info!(image = %image_path.display(), "detector reported nothing");
        }
        Ok(self.extract_image(image_path, label).await?.record)
    }

    /// Detects every image under `images_dir`, writing `json/<stem>.json`
    /// (and `viz/<stem>.jpg` when `visualize` is set) into the run
    /// directory, which is returned.
    pub async fn test(&self, images_dir: &Path, visualize: bool) -> Result<PathBuf> {
        let weights = self.require_weights()?;
        if !images_dir.is_dir() {
            return Err(ReceiptError::NotFound(images_dir.to_path_buf()));
        }

        let output = self.detector.detect(weights, images_dir).await?;
        let json_dir = output.run_dir.join("json");
        let viz_dir = output.run_dir.join("viz");
        fs::create_dir_all(&json_dir).await?;
        let font = if visualize {
            fs::create_dir_all(&viz_dir).await?;
            load_font()
        } else {
            None
        };

        let mut written = 0usize;
        for label in &output.label_files {
            let stem = file_stem(label);
            let Some(image_path) = find_image_by_stem(images_dir, &stem)
                .or_else(|| find_any_by_stem(&output.run_dir, &stem))
            else {
                warn!(label = %label.display(), "no image found for label file, skipping");
                continue;
            };

            let extraction = self.extract_image(&image_path, Some(label)).await?;
            let json = serde_json::to_string_pretty(&extraction.record)?;
            fs::write(json_dir.join(format!("{}.json", stem)), json).await?;
            if visualize {
                save_visualization(
                    &viz_dir.join(format!("{}.jpg", stem)),
                    &extraction.image,
                    &extraction.detections,
                    font.as_ref(),
                )?;
            }
            written += 1;
        }

        info!(records = written, run = %output.run_dir.display(), "batch finished");
        Ok(output.run_dir)
    }
}
