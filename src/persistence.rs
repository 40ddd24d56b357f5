pub mod error;
pub mod naming;

pub use error::SaveError;
pub use naming::{file_stem, resolve_destination, same_file};

use crate::OutputConfig;
use crate::layout::GlyphPainter;
use crate::render::{self, OutputFormat, Watermark};
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything needed to write one edited image.
pub struct SaveRequest<'a> {
    /// The file the image was loaded from.
    pub source: &'a Path,
    /// Desired output file name without extension.
    pub stem: &'a str,
    /// Decoded pixels of `source`.
    pub image: &'a DynamicImage,
    pub watermark: Option<Watermark<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub destination: PathBuf,
    pub backup: Option<PathBuf>,
    pub removed_original: bool,
}

/// Save the watermarked image under a new name next to the original.
///
/// The original is copied into the backup folder first. When the destination
/// differs from the source, the source is deleted after the new file is
/// written. Backup and delete failures are logged and do not fail the save;
/// a failed write removes the fresh backup and leaves the source untouched.
pub fn save<P: GlyphPainter + ?Sized>(
    request: &SaveRequest,
    painter: &P,
    options: &OutputConfig,
) -> Result<SaveOutcome, SaveError> {
    let stem = request.stem.trim();
    if stem.is_empty() {
        return Err(SaveError::EmptyName);
    }

    let destination = resolve_destination(request.source, stem, options.max_collision_suffix)?;
    let format = OutputFormat::from_path(&destination)
        .ok_or_else(|| SaveError::UnsupportedFormat(destination.clone()))?;

    let flattened = render::flatten(request.image, request.watermark.as_ref(), painter);
    let bytes = render::encode(&flattened, format, options.jpeg_quality)?;

    let backup_dir = backup_folder(request.source, &options.backup_directory);
    let had_backup_dir = backup_dir.exists();
    let backup = backup_original(request.source, stem, &options.backup_directory);

    if let Err(e) = write_replacing(&destination, &bytes) {
        if let Some(backup) = &backup {
            let _ = fs::remove_file(backup);
        }
        if !had_backup_dir {
            let _ = fs::remove_dir(&backup_dir);
        }
        return Err(e);
    }
    info!("Saved: {:?}", destination);

    let removed_original = if same_file(request.source, &destination) {
        false
    } else {
        match fs::remove_file(request.source) {
            Ok(()) => {
                info!("Deleted original: {:?}", request.source);
                true
            }
            Err(e) => {
                warn!("Delete failed for {:?}: {}", request.source, e);
                false
            }
        }
    };

    Ok(SaveOutcome {
        destination,
        backup,
        removed_original,
    })
}

/// Copy `source` to `<folder>/<backup_dir>/<stem>_<new_stem>.bak`.
///
/// Returns `None` when the copy could not be made.
pub fn backup_original(source: &Path, new_stem: &str, backup_dir: &str) -> Option<PathBuf> {
    let backup_dir = backup_folder(source, backup_dir);

    if let Err(e) = fs::create_dir_all(&backup_dir) {
        warn!("Could not create backup folder {:?}: {}", backup_dir, e);
    }

    let target = backup_dir.join(format!("{}_{}.bak", file_stem(source), new_stem));
    match fs::copy(source, &target) {
        Ok(bytes) => {
            debug!("Backed up {:?} to {:?} ({} bytes)", source, target, bytes);
            Some(target)
        }
        Err(e) => {
            warn!("Backup failed for {:?}: {}", source, e);
            None
        }
    }
}

fn backup_folder(source: &Path, backup_dir: &str) -> PathBuf {
    source
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(backup_dir)
}

// Write next to the destination first so a failed write never truncates it.
fn write_replacing(destination: &Path, bytes: &[u8]) -> Result<(), SaveError> {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = destination.with_file_name(format!(".{}.partial", file_name));

    let result = fs::write(&partial, bytes).and_then(|()| fs::rename(&partial, destination));
    if let Err(source) = result {
        let _ = fs::remove_file(&partial);
        return Err(SaveError::Write {
            path: destination.to_path_buf(),
            source,
        });
    }

    Ok(())
}
