use super::SaveError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// File name of `path` without its extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The extension of `path` including its dot, exactly as written.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Whether two paths name the same file once normalized.
pub fn same_file(a: &Path, b: &Path) -> bool {
    normalize(a) == normalize(b)
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Pick where `source` is saved as `stem`.
///
/// Keeping the same name overwrites the source. Any other existing file is
/// left alone and `stem(1)`, `stem(2)`, … are tried in order, up to
/// `max_suffix`.
pub fn resolve_destination(source: &Path, stem: &str, max_suffix: u32) -> Result<PathBuf, SaveError> {
    let folder = source.parent().unwrap_or_else(|| Path::new(""));
    let ext = dotted_extension(source);

    let candidate = folder.join(with_extension(stem, &ext));
    if !candidate.exists() || same_file(&candidate, source) {
        return Ok(candidate);
    }

    for counter in 1..=max_suffix {
        let candidate = folder.join(with_extension(&format!("{}({})", stem, counter), &ext));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(SaveError::CollisionExhausted {
        stem: stem.to_string(),
        attempts: max_suffix,
    })
}

// Not `Path::with_extension`: a stem like "v1.2" must keep its dot.
fn with_extension(stem: &str, dotted_ext: &str) -> OsString {
    let mut name = OsString::from(stem);
    name.push(dotted_ext);
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_stem_and_extension() {
        let path = Path::new("/photos/IMG_0001.JPG");
        assert_eq!(file_stem(path), "IMG_0001");
        assert_eq!(dotted_extension(path), ".JPG");
        assert_eq!(dotted_extension(Path::new("/photos/raw")), "");
    }

    #[test]
    fn test_free_name_is_used_as_is() {
        let dir = TempDir::new().unwrap();
        let source = touch(dir.path(), "a.jpg");

        let dest = resolve_destination(&source, "sunset", 10).unwrap();
        assert_eq!(dest, dir.path().join("sunset.jpg"));
    }

    #[test]
    fn test_same_name_overwrites_source() {
        let dir = TempDir::new().unwrap();
        let source = touch(dir.path(), "a.png");

        let dest = resolve_destination(&source, "a", 10).unwrap();
        assert!(same_file(&dest, &source));
    }

    #[test]
    fn test_collisions_take_first_free_suffix() {
        let dir = TempDir::new().unwrap();
        let source = touch(dir.path(), "a.jpg");
        touch(dir.path(), "name.jpg");

        assert_eq!(
            resolve_destination(&source, "name", 10).unwrap(),
            dir.path().join("name(1).jpg")
        );

        touch(dir.path(), "name(1).jpg");
        assert_eq!(
            resolve_destination(&source, "name", 10).unwrap(),
            dir.path().join("name(2).jpg")
        );
    }

    #[test]
    fn test_dotted_stem_keeps_its_dot() {
        let dir = TempDir::new().unwrap();
        let source = touch(dir.path(), "a.jpeg");

        let dest = resolve_destination(&source, "v1.2", 10).unwrap();
        assert_eq!(dest, dir.path().join("v1.2.jpeg"));
    }

    #[test]
    fn test_collision_search_is_bounded() {
        let dir = TempDir::new().unwrap();
        let source = touch(dir.path(), "a.jpg");
        touch(dir.path(), "b.jpg");
        touch(dir.path(), "b(1).jpg");
        touch(dir.path(), "b(2).jpg");

        let result = resolve_destination(&source, "b", 2);
        assert!(matches!(
            result,
            Err(SaveError::CollisionExhausted { attempts: 2, .. })
        ));
    }
}
