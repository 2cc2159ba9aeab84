//! Command line arguments backing the `receipt` binary.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
  name = "receipt",
  about = "Train a receipt field detector and turn its detections into structured JSON",
  version
)]
pub struct Args {
  /// YOLOv5 checkout used for training and detection
  #[arg(long, global = true, env = "RECEIPT_YOLOV5_DIR", default_value = "yolov5")]
  pub yolov5_dir: PathBuf,

  /// Python interpreter that runs the YOLOv5 scripts
  #[arg(long, global = true, env = "RECEIPT_PYTHON", default_value = "python3")]
  pub python: String,

  /// Detector weights (defaults to the checkout's best training checkpoint)
  #[arg(long, global = true, env = "RECEIPT_WEIGHTS")]
  pub weights: Option<PathBuf>,

  /// Tesseract language
  #[arg(long, global = true, default_value = "eng")]
  pub ocr_lang: String,

  /// Only log warnings and errors
  #[arg(long, global = true)]
  pub quiet: bool,

  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Clone the YOLOv5 checkout if it is missing
  Setup,
  /// Render every PDF in a directory to page images
  Rasterize {
    pdf_dir: PathBuf,
    out_dir: PathBuf,

    #[arg(long, default_value = "300")]
    dpi: u32,
  },
  /// Train the detector on a YOLO-layout dataset
  Train {
    #[arg(default_value = "data/receipts")]
    dataset_root: PathBuf,

    /// Where the dataset YAML is written
    #[arg(long, default_value = "data/receipts.yaml")]
    yaml: PathBuf,

    #[arg(long, default_value = "100")]
    epochs: u32,

    #[arg(long, default_value = "16")]
    batch: u32,

    #[arg(long, default_value = "640")]
    img: u32,
  },
  /// Detect and extract one image, printing its JSON record
  Infer {
    image: PathBuf,

    #[arg(long, default_value = "640")]
    img: u32,

    #[arg(long, default_value = "0.25")]
    conf: f32,
  },
  /// Detect and extract a directory of images, writing one JSON file per image
  Test {
    images_dir: PathBuf,

    #[arg(long, default_value = "640")]
    img: u32,

    #[arg(long, default_value = "0.25")]
    conf: f32,

    /// Also write annotated images
    #[arg(long)]
    visualize: bool,
  },
  /// Extract a record from an image and an existing label file
  Extract { image: PathBuf, labels: PathBuf },
  /// Check a dataset for missing splits and bad label lines
  Validate {
    #[arg(default_value = "data/receipts")]
    dataset_root: PathBuf,
  },
}
