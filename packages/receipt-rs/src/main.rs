mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Commands};
use receipt_ocr::{TesseractOcrEngine, TesseractOptions};
use receipt_rs::{
  rasterize_dir, ClassList, PdftoppmOptions, PdftoppmRasterizer, PipelineOptions, ReceiptPipeline, Yolov5Detector,
  Yolov5Options,
};
use std::path::PathBuf;

fn detector_options(args: &Args) -> Yolov5Options {
  Yolov5Options {
    repo_dir: args.yolov5_dir.clone(),
    python: args.python.clone(),
    ..Yolov5Options::default()
  }
}

async fn run(args: Args) -> Result<()> {
  let mut yolo = detector_options(&args);
  let mut yaml_path = PipelineOptions::default().yaml_path;

  match &args.command {
    Commands::Train {
      epochs, batch, img, yaml, ..
    } => {
      yolo.epochs = *epochs;
      yolo.batch = *batch;
      yolo.img_size = *img;
      yaml_path = yaml.clone();
    }
    Commands::Infer { img, conf, .. } | Commands::Test { img, conf, .. } => {
      yolo.img_size = *img;
      yolo.confidence = *conf;
    }
    _ => {}
  }

  let detector = Yolov5Detector::new(yolo);
  let ocr = TesseractOcrEngine::with_options(TesseractOptions {
    language: args.ocr_lang.clone(),
    ..TesseractOptions::default()
  });
  let weights: PathBuf = args.weights.clone().unwrap_or_else(|| detector.weights_path());
  let pipeline = ReceiptPipeline::new(
    &detector,
    &ocr,
    ClassList::receipt(),
    PipelineOptions { weights, yaml_path },
  );

  match args.command {
    Commands::Version => {
      println!("receipt {}", env!("CARGO_PKG_VERSION"));
    }
    Commands::Setup => {
      let repo = detector.ensure_checkout().await.context("Failed to prepare YOLOv5 checkout")?;
      println!("{}", repo.display());
    }
    Commands::Rasterize { pdf_dir, out_dir, dpi } => {
      let rasterizer = PdftoppmRasterizer::new(PdftoppmOptions {
        dpi,
        ..PdftoppmOptions::default()
      });
      let pages = rasterize_dir(&rasterizer, &pdf_dir, &out_dir)
        .await
        .with_context(|| format!("Failed to rasterize PDFs in {}", pdf_dir.display()))?;
      for page in pages {
        println!("{}", page.display());
      }
    }
    Commands::Train { dataset_root, .. } => {
      let best = pipeline.train(&dataset_root).await.context("Training failed")?;
      println!("{}", best.display());
    }
    Commands::Infer { image, .. } => {
      let record = pipeline
        .infer(&image)
        .await
        .with_context(|| format!("Inference failed for {}", image.display()))?;
      println!("{}", serde_json::to_string(&record)?);
    }
    Commands::Test {
      images_dir, visualize, ..
    } => {
      let run_dir = pipeline
        .test(&images_dir, visualize)
        .await
        .with_context(|| format!("Batch run failed for {}", images_dir.display()))?;
      println!("{}", run_dir.display());
    }
    Commands::Extract { image, labels } => {
      if !labels.is_file() {
        anyhow::bail!("label file not found: {}", labels.display());
      }
      let extraction = pipeline
        .extract_image(&image, Some(&labels))
        .await
        .with_context(|| format!("Extraction failed for {}", image.display()))?;
      println!("{}", serde_json::to_string(&extraction.record)?);
    }
    Commands::Validate { dataset_root } => {
      let issues = pipeline.validate(&dataset_root);
      println!("{}", serde_json::json!({ "issues": issues }));
    }
  }

  Ok(())
}

#[tokio::main]
async fn main() {
  let args = Args::parse();
  logging::init(args.quiet);

  if let Err(e) = run(args).await {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
  }
}
