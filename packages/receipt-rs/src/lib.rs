//! # receipt-rs
//!
//! Post-processing for a receipt field detector: decode the detector's label
//! files, pair line items by vertical overlap, and OCR each field into a
//! structured record.
//!
//! ## Features
//!
//! - **Label decoding**: normalized `cx cy w h [conf]` rows to clamped pixel boxes
//! - **Line-item pairing**: product / quantity / unit-price rows matched by vertical IoU
//! - **Field extraction**: highest-confidence single fields plus ordered line items, OCR'd per crop
//! - **Tool adapters**: YOLOv5 checkout, `tesseract` and `pdftoppm` behind small traits
//! - **Dataset checks**: YAML generation and label validation for training sets
//!
//! ## Quick Start
//!
//! ```ignore
//! use receipt_rs::prelude::*;
//! use receipt_ocr::TesseractOcrEngine;
//!
//! let classes = ClassList::receipt();
//! let detections = parse_label_file("2 0.5 0.3 0.6 0.05 0.91", 1240, 1754, &classes);
//!
//! let ocr = TesseractOcrEngine::new();
//! let image = image::open("receipt.jpg")?.to_rgb8();
//! let record = RecordExtractor::new(&ocr).extract(&image, &detections).await?;
//! println!("{}", serde_json::to_string(&record)?);
//! ```

pub mod classes;
pub mod dataset;
pub mod detection;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod fields;
pub mod overlap;
pub mod pairing;
pub mod pipeline;
pub mod process;
pub mod rasterizer;
pub mod visualize;

// Re-export commonly used types at the root level
pub use classes::{ClassList, RECEIPT_CLASSES};
pub use dataset::{validate_dataset, write_yaml, DatasetSpec};
pub use detection::{decode_label_line, parse_label_file, read_label_file, Detection, PixelBox, SkippedLine};
pub use detector::{DetectOutput, Detector, Yolov5Detector, Yolov5Options};
pub use error::{ReceiptError, Result};
pub use extractor::{crop, LineItemText, RecordExtractor, StructuredRecord};
pub use fields::{select_single, ReceiptField, SINGLE_FIELDS};
pub use overlap::vertical_iou;
pub use pairing::{pair_line_items, LineItem};
pub use pipeline::{find_image_by_stem, Extraction, PipelineOptions, ReceiptPipeline};
pub use rasterizer::{rasterize_dir, PdftoppmOptions, PdftoppmRasterizer, Rasterizer};
pub use visualize::{draw_detections, load_font, save_visualization};

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```ignore
/// use receipt_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        crop, decode_label_line, draw_detections, find_image_by_stem, load_font, pair_line_items, parse_label_file,
        rasterize_dir, read_label_file, save_visualization, select_single, validate_dataset, vertical_iou,
        write_yaml, ClassList, DatasetSpec, DetectOutput, Detection, Detector, Extraction, LineItem,
        LineItemText, PdftoppmOptions, PdftoppmRasterizer, PipelineOptions, PixelBox, Rasterizer,
        ReceiptError, ReceiptField, ReceiptPipeline, RecordExtractor, SkippedLine, StructuredRecord,
        Yolov5Detector, Yolov5Options, RECEIPT_CLASSES, SINGLE_FIELDS,
    };
}
