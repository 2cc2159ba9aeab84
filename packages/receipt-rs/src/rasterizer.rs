//! PDF to page-image conversion through an external renderer.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::info;

use crate::error::{ReceiptError, Result};
use crate::process;

#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Renders every page of `pdf` into `out_dir`, returning the page images
    /// in page order.
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone)]
pub struct PdftoppmOptions {
    pub binary: PathBuf,
    pub dpi: u32,
}

impl Default for PdftoppmOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            dpi: 300,
        }
    }
}

/// Renders JPEG pages with poppler's `pdftoppm`, named `<stem>_page<i>.jpg`
/// with a zero-based page index.
pub struct PdftoppmRasterizer {
    options: PdftoppmOptions,
}

impl PdftoppmRasterizer {
    pub fn new(options: PdftoppmOptions) -> Self {
        Self { options }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new(PdftoppmOptions::default())
    }
}

const RENDER_PREFIX: &str = "page";

/// Page number pdftoppm encoded in `file_name`, e.g. `page-07.jpg` -> 7.
fn rendered_page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(RENDER_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".jpg")?
        .parse()
        .ok()
}

pub fn page_file_name(stem: &str, index: u32) -> String {
    format!("{}_page{}.jpg", stem, index)
}

#[async_trait]
impl Rasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        if !pdf.is_file() {
            return Err(ReceiptError::NotFound(pdf.to_path_buf()));
        }
        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        fs::create_dir_all(out_dir).await?;

        let scratch = tempfile::tempdir()?;
        process::run(
            Command::new(&self.options.binary)
                .arg("-jpeg")
                .arg("-r")
                .arg(self.options.dpi.to_string())
                .arg(pdf)
                .arg(scratch.path().join(RENDER_PREFIX)),
        )
        .await?;

        let mut rendered = Vec::new();
        let mut entries = fs::read_dir(scratch.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(number) = name.to_str().and_then(rendered_page_number) {
                rendered.push((number, entry.path()));
            }
        }
        rendered.sort();

        let mut pages = Vec::with_capacity(rendered.len());
        for (number, path) in rendered {
            let target = out_dir.join(page_file_name(&stem, number.saturating_sub(1)));
            fs::copy(&path, &target).await?;
            pages.push(target);
        }
        info!(pdf = %pdf.display(), pages = pages.len(), "rasterized");
        Ok(pages)
    }
}

/// Rasterizes every `.pdf` directly inside `pdf_dir`, in file-name order.
pub async fn rasterize_dir(
    rasterizer: &dyn Rasterizer,
    pdf_dir: &Path,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if !pdf_dir.is_dir() {
        return Err(ReceiptError::NotFound(pdf_dir.to_path_buf()));
    }

    let mut pdfs = Vec::new();
    let mut entries = fs::read_dir(pdf_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();

    let mut pages = Vec::new();
    for pdf in pdfs {
        pages.extend(rasterizer.rasterize(&pdf, out_dir).await?);
    }
    Ok(pages)
}
