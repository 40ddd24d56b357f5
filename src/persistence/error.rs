use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Output file name is empty")]
    EmptyName,

    #[error("Reset the zoom to 1:1 before saving")]
    ZoomedView,

    #[error("No image is loaded")]
    NoImage,

    #[error("No free file name for '{stem}' after {attempts} attempts")]
    CollisionExhausted { stem: String, attempts: u32 },

    #[error("Unsupported output format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("Image error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SaveError {
    /// Validation problems the user can fix before retrying.
    pub fn is_validation(&self) -> bool {
        matches!(self, SaveError::EmptyName | SaveError::ZoomedView)
    }
}
