//! Training dataset description and sanity checks.
//!
//! The expected layout is the YOLO one:
//!
//! ```text
//! <root>/images/{train,val}/...
//! <root>/labels/{train,val}/....txt
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::classes::ClassList;
use crate::error::Result;

pub const SPLITS: [&str; 2] = ["train", "val"];

/// A dataset root together with the YAML file describing it to the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSpec {
    pub root: PathBuf,
    pub yaml_path: PathBuf,
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

pub fn render_yaml(root: &Path, classes: &ClassList) -> String {
    format!(
        "path: {}\ntrain: images/train\nval: images/val\nnames: [{}]\n",
        root.display(),
        classes.yaml_names()
    )
}

/// Writes the detector's dataset YAML for `root` to `yaml_path`, creating
/// parent directories as needed.
pub fn write_yaml(root: &Path, yaml_path: &Path, classes: &ClassList) -> Result<DatasetSpec> {
    let root = absolute(root)?;
    if let Some(parent) = yaml_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(yaml_path, render_yaml(&root, classes))?;
    info!(yaml = %yaml_path.display(), classes = classes.len(), "wrote dataset description");

    Ok(DatasetSpec {
        root,
        yaml_path: yaml_path.to_path_buf(),
    })
}

fn check_label_file(path: &Path, classes: &ClassList, issues: &mut Vec<String>) {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            issues.push(format!("unreadable {}: {}", path.display(), e));
            return;
        }
    };

    for line in contents.trim().lines() {
        let Some(first) = line.split_whitespace().next() else {
            continue;
        };
        match first.parse::<i64>() {
            Ok(id) if id < 0 || !classes.contains_id(id as usize) => {
                issues.push(format!("bad class id {} in {}", id, path.display()));
            }
            Ok(_) => {}
            Err(_) => issues.push(format!("invalid line in {}: {}", path.display(), line)),
        }
    }
}

/// Lists problems with the dataset under `root`: missing split directories,
/// label lines whose class id is outside `classes`, and unparsable lines.
pub fn validate_dataset(root: &Path, classes: &ClassList) -> Vec<String> {
    let mut issues = Vec::new();

    for split in SPLITS {
        let image_dir = root.join("images").join(split);
        let label_dir = root.join("labels").join(split);
        if !image_dir.exists() {
            issues.push(format!("missing images/{}", split));
        }
        if !label_dir.exists() {
            issues.push(format!("missing labels/{}", split));
            continue;
        }

        let label_files = WalkDir::new(&label_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("txt"));
        for entry in label_files {
            check_label_file(entry.path(), classes, &mut issues);
        }
    }

    issues
}
