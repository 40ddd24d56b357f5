use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to read folder {path:?}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Not a folder: {0:?}")]
    NotADirectory(PathBuf),

    #[error("No images found in {0:?}")]
    NoImages(PathBuf),

    #[error("Editing is disabled while zoomed in")]
    Zoomed,

    #[error("Image index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },
}
