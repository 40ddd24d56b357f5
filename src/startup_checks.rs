use crate::Config;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Image folder does not exist: {0:?}")]
    FolderMissing(PathBuf),

    #[error("Image folder is not readable: {0}")]
    FolderUnreadable(#[source] std::io::Error),

    #[error("Font file missing: {0:?}")]
    FontMissing(PathBuf),

    #[error("JPEG quality must be between 1 and 100, got {0}")]
    InvalidJpegQuality(u8),

    #[error("Backup directory name is empty")]
    EmptyBackupDirectory,
}

impl StartupCheckError {
    /// Failures that make running pointless.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StartupCheckError::FolderMissing(_) | StartupCheckError::FolderUnreadable(_)
        )
    }
}

/// Check the config and the image folder before touching any file.
///
/// `needs_font` is false when no watermark text will be drawn.
pub fn perform_startup_checks(
    config: &Config,
    folder: Option<&Path>,
    needs_font: bool,
) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    if let Some(folder) = folder {
        if !folder.exists() {
            error!("Image folder does not exist: {:?}", folder);
            errors.push(StartupCheckError::FolderMissing(folder.to_path_buf()));
        } else {
            match std::fs::read_dir(folder) {
                Ok(_) => info!("Image folder is accessible: {:?}", folder),
                Err(e) => {
                    error!("Image folder is not accessible: {}", e);
                    errors.push(StartupCheckError::FolderUnreadable(e));
                }
            }
        }
    }

    let font_path = &config.watermark.font_path;
    if !font_path.exists() {
        if needs_font {
            warn!("Font file missing: {:?}", font_path);
            errors.push(StartupCheckError::FontMissing(font_path.clone()));
        }
    } else {
        info!("Font file found: {:?}", font_path);
    }

    let quality = config.output.jpeg_quality;
    if !(1..=100).contains(&quality) {
        warn!("JPEG quality out of range: {}", quality);
        errors.push(StartupCheckError::InvalidJpegQuality(quality));
    }

    if config.output.backup_directory.trim().is_empty() {
        warn!("Backup directory name is empty");
        errors.push(StartupCheckError::EmptyBackupDirectory);
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_with_font(font: PathBuf) -> Config {
        let mut config = Config::default();
        config.watermark.font_path = font;
        config
    }

    #[test]
    fn test_all_checks_pass() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("font.ttf");
        std::fs::write(&font, b"").unwrap();

        let config = config_with_font(font);
        assert!(perform_startup_checks(&config, Some(dir.path()), true).is_ok());
    }

    #[test]
    fn test_missing_folder_is_critical() {
        let dir = TempDir::new().unwrap();
        let config = config_with_font(dir.path().join("none.ttf"));

        let errors =
            perform_startup_checks(&config, Some(&dir.path().join("gone")), false).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_critical());
    }

    #[test]
    fn test_missing_font_only_matters_with_text() {
        let dir = TempDir::new().unwrap();
        let config = config_with_font(dir.path().join("none.ttf"));

        assert!(perform_startup_checks(&config, Some(dir.path()), false).is_ok());

        let errors = perform_startup_checks(&config, Some(dir.path()), true).unwrap_err();
        assert!(matches!(errors[0], StartupCheckError::FontMissing(_)));
        assert!(!errors[0].is_critical());
    }

    #[test]
    fn test_bad_output_settings() {
        let dir = TempDir::new().unwrap();
        let mut config = config_with_font(dir.path().join("none.ttf"));
        config.output.jpeg_quality = 0;
        config.output.backup_directory = "  ".to_string();

        let errors = perform_startup_checks(&config, None, false).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
