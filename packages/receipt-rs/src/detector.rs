//! Object detector interface and the YOLOv5 checkout adapter behind it.
//!
//! The pipeline only sees [`Detector`]: training produces a weights file,
//! detection produces one label file per image. How the detector is run is
//! the adapter's business.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::info;

use crate::dataset::DatasetSpec;
use crate::error::{ReceiptError, Result};
use crate::process;

pub const YOLOV5_REPO_URL: &str = "https://github.com/ultralytics/yolov5";

/// Label files written by one detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectOutput {
    pub run_dir: PathBuf,
    pub label_files: Vec<PathBuf>,
}

impl DetectOutput {
    /// Label file written for the image with file stem `stem`.
    pub fn label_for(&self, stem: &str) -> Option<&Path> {
        self.label_files
            .iter()
            .find(|p| p.file_stem().and_then(|s| s.to_str()) == Some(stem))
            .map(PathBuf::as_path)
    }
}

#[async_trait]
pub trait Detector: Send + Sync {
    /// Trains on `dataset` and returns the best-weights path.
    async fn train(&self, dataset: &DatasetSpec) -> Result<PathBuf>;

    /// Runs `weights` over `source`, a single image or a directory of images.
    async fn detect(&self, weights: &Path, source: &Path) -> Result<DetectOutput>;
}

#[derive(Debug, Clone)]
pub struct Yolov5Options {
    pub repo_dir: PathBuf,
    pub python: String,
    /// Checkpoint training starts from.
    pub base_weights: String,
    pub img_size: u32,
    pub batch: u32,
    pub epochs: u32,
    pub confidence: f32,
    pub train_run: String,
    /// Run name used when detecting on a single image.
    pub infer_run: String,
    /// Run name used when detecting on a directory.
    pub test_run: String,
}

impl Default for Yolov5Options {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("yolov5"),
            python: "python3".to_string(),
            base_weights: "yolov5s.pt".to_string(),
            img_size: 640,
            batch: 16,
            epochs: 100,
            confidence: 0.25,
            train_run: "receipt_det".to_string(),
            infer_run: "receipt_infer".to_string(),
            test_run: "receipt_test".to_string(),
        }
    }
}

/// Drives `train.py` / `detect.py` of a local YOLOv5 checkout.
pub struct Yolov5Detector {
    options: Yolov5Options,
}

impl Yolov5Detector {
    pub fn new(options: Yolov5Options) -> Self {
        Self { options }
    }

    /// Where training leaves its best checkpoint.
    pub fn weights_path(&self) -> PathBuf {
        self.options
            .repo_dir
            .join("runs")
            .join("train")
            .join(&self.options.train_run)
            .join("weights")
            .join("best.pt")
    }

    fn run_dir(&self, run: &str) -> PathBuf {
        self.options.repo_dir.join("runs").join("detect").join(run)
    }

    /// Clones the YOLOv5 repository unless the checkout already exists.
    pub async fn ensure_checkout(&self) -> Result<PathBuf> {
        let repo = &self.options.repo_dir;
        if repo.exists() {
            return Ok(repo.clone());
        }
        if let Some(parent) = repo.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        info!(dir = %repo.display(), "cloning {}", YOLOV5_REPO_URL);
        process::run(Command::new("git").arg("clone").arg(YOLOV5_REPO_URL).arg(repo)).await?;
        Ok(repo.clone())
    }

    fn require_checkout(&self) -> Result<()> {
        if !self.options.repo_dir.is_dir() {
            return Err(ReceiptError::NotFound(self.options.repo_dir.clone()));
        }
        Ok(())
    }
}

async fn require(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(ReceiptError::NotFound(path.to_path_buf()));
    }
    Ok(fs::canonicalize(path).await?)
}

async fn list_label_files(labels_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !labels_dir.is_dir() {
        return Ok(files);
    }
    let mut entries = fs::read_dir(labels_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[async_trait]
impl Detector for Yolov5Detector {
    async fn train(&self, dataset: &DatasetSpec) -> Result<PathBuf> {
        self.require_checkout()?;
        let yaml = require(&dataset.yaml_path).await?;
        let opts = &self.options;

        info!(epochs = opts.epochs, batch = opts.batch, run = %opts.train_run, "training detector");
        process::run(
            Command::new(&opts.python)
                .arg("train.py")
                .arg("--img")
                .arg(opts.img_size.to_string())
                .arg("--batch")
                .arg(opts.batch.to_string())
                .arg("--epochs")
                .arg(opts.epochs.to_string())
                .arg("--data")
                .arg(&yaml)
                .arg("--weights")
                .arg(&opts.base_weights)
                .arg("--name")
                .arg(&opts.train_run)
                .arg("--exist-ok")
                .current_dir(&opts.repo_dir),
        )
        .await?;

        let best = self.weights_path();
        if !best.exists() {
            return Err(ReceiptError::NotFound(best));
        }
        Ok(best)
    }

    async fn detect(&self, weights: &Path, source: &Path) -> Result<DetectOutput> {
        self.require_checkout()?;
        let weights = require(weights).await?;
        let source = require(source).await?;
        let opts = &self.options;

        let run = if source.is_dir() {
            &opts.test_run
        } else {
            &opts.infer_run
        };
        let run_dir = self.run_dir(run);
        if run_dir.exists() {
            fs::remove_dir_all(&run_dir).await?;
        }

        info!(source = %source.display(), run = %run, "running detector");
        process::run(
            Command::new(&opts.python)
                .arg("detect.py")
                .arg("--weights")
                .arg(&weights)
                .arg("--img")
                .arg(opts.img_size.to_string())
                .arg("--conf")
                .arg(opts.confidence.to_string())
                .arg("--source")
                .arg(&source)
                .args(["--save-txt", "--save-conf"])
                .args(["--project", "runs/detect"])
                .arg("--name")
                .arg(run)
                .arg("--exist-ok")
                .current_dir(&opts.repo_dir),
        )
        .await?;

        let label_files = list_label_files(&run_dir.join("labels")).await?;
        Ok(DetectOutput {
            run_dir,
            label_files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_for_matches_stem() {
        let out = DetectOutput {
            run_dir: PathBuf::from("runs/detect/x"),
            label_files: vec![
                PathBuf::from("runs/detect/x/labels/a_page0.txt"),
                PathBuf::from("runs/detect/x/labels/a_page1.txt"),
            ],
        };
        assert_eq!(
            out.label_for("a_page1"),
            Some(Path::new("runs/detect/x/labels/a_page1.txt"))
        );
        assert_eq!(out.label_for("a_page"), None);
    }

    #[test]
    fn test_weights_path() {
        let detector = Yolov5Detector::new(Yolov5Options {
            repo_dir: PathBuf::from("/opt/yolov5"),
            ..Yolov5Options::default()
        });
        assert_eq!(
            detector.weights_path(),
            PathBuf::from("/opt/yolov5/runs/train/receipt_det/weights/best.pt")
        );
    }

    #[tokio::test]
    async fn test_missing_checkout_is_not_found() {
        let detector = Yolov5Detector::new(Yolov5Options {
            repo_dir: PathBuf::from("/nonexistent/yolov5"),
            ..Yolov5Options::default()
        });
        let err = detector
            .detect(Path::new("best.pt"), Path::new("img.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiptError::NotFound(p) if p == Path::new("/nonexistent/yolov5")));
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;

        const FAKE_DETECT: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --name) name="$2"; shift ;;
  esac
  shift
done
mkdir -p "runs/detect/$name/labels"
printf '2 0.5 0.5 0.5 0.1 0.9\n' > "runs/detect/$name/labels/receipt.txt"
printf 'not a label\n' > "runs/detect/$name/labels/notes.md"
"#;

        const FAKE_TRAIN: &str = r#"
while [ $# -gt 0 ]; do
  case "$1" in
    --name) name="$2"; shift ;;
  esac
  shift
done
mkdir -p "runs/train/$name/weights"
touch "runs/train/$name/weights/best.pt"
"#;

        fn fake_checkout() -> (tempfile::TempDir, Yolov5Detector) {
            let dir = tempfile::tempdir().unwrap();
            let repo = dir.path().join("yolov5");
            std::fs::create_dir_all(&repo).unwrap();
            std::fs::write(repo.join("detect.py"), FAKE_DETECT).unwrap();
            std::fs::write(repo.join("train.py"), FAKE_TRAIN).unwrap();
            let detector = Yolov5Detector::new(Yolov5Options {
                repo_dir: repo,
                python: "sh".to_string(),
                ..Yolov5Options::default()
            });
            (dir, detector)
        }

        #[tokio::test]
        async fn test_detect_single_image_uses_infer_run() {
            let (dir, detector) = fake_checkout();
            let weights = dir.path().join("best.pt");
            let image = dir.path().join("receipt.jpg");
            std::fs::write(&weights, b"").unwrap();
            std::fs::write(&image, b"").unwrap();

            let out = detector.detect(&weights, &image).await.unwrap();

            assert!(out.run_dir.ends_with("runs/detect/receipt_infer"));
            assert_eq!(out.label_files.len(), 1);
            assert!(out.label_for("receipt").is_some());
        }

        #[tokio::test]
        async fn test_detect_directory_uses_test_run() {
            let (dir, detector) = fake_checkout();
            let weights = dir.path().join("best.pt");
            std::fs::write(&weights, b"").unwrap();
            let images = dir.path().join("images");
            std::fs::create_dir_all(&images).unwrap();

            let out = detector.detect(&weights, &images).await.unwrap();
            assert!(out.run_dir.ends_with("runs/detect/receipt_test"));
        }

        #[tokio::test]
        async fn test_train_returns_best_weights() {
            let (dir, detector) = fake_checkout();
            let yaml = dir.path().join("receipts.yaml");
            std::fs::write(&yaml, "names: []\n").unwrap();
            let spec = DatasetSpec {
                root: dir.path().to_path_buf(),
                yaml_path: yaml,
            };

            let best = detector.train(&spec).await.unwrap();
            assert_eq!(best, detector.weights_path());
            assert!(best.exists());
        }

        #[tokio::test]
        async fn test_missing_weights_is_not_found() {
            let (dir, detector) = fake_checkout();
            let err = detector
                .detect(&dir.path().join("missing.pt"), dir.path())
                .await
                .unwrap_err();
            assert!(matches!(err, ReceiptError::NotFound(_)));
        }
    }
}
