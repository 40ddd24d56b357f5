use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RevealError {
    #[error("File does not exist: {0:?}")]
    NotFound(PathBuf),

    #[error("Could not open the file manager: {0}")]
    Launch(#[from] std::io::Error),
}

/// Build the platform command that shows `path` in the file manager.
pub fn reveal_command(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut command = Command::new("explorer");
        command.arg(format!("/select,{}", path.display()));
        command
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg("-R").arg(path);
        command
    } else {
        // xdg-open can't select a file, so open its folder.
        let folder = path.parent().unwrap_or(path);
        let mut command = Command::new("xdg-open");
        command.arg(folder);
        command
    }
}

/// Show `path` in the system file manager without waiting for it.
pub fn reveal(path: &Path) -> Result<(), RevealError> {
    if !path.exists() {
        return Err(RevealError::NotFound(path.to_path_buf()));
    }
    let path = path.canonicalize()?;

    info!("Revealing {:?}", path);
    reveal_command(&path).spawn()?;
    Ok(())
}
