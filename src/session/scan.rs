use super::SessionError;
use crate::render::OutputFormat;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub fn is_supported_image(path: &Path) -> bool {
    OutputFormat::from_path(path).is_some()
}

/// List the images directly inside `dir`, sorted by path.
pub fn scan_folder(dir: &Path) -> Result<Vec<PathBuf>, SessionError> {
    if !dir.is_dir() {
        return Err(SessionError::NotADirectory(dir.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| SessionError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;

        if entry.path().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }

    images.sort();
    debug!("Found {} images in {:?}", images.len(), dir);
    Ok(images)
}
