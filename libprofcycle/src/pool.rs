//! Image pool discovery
//!
//! A pool is the set of eligible image files directly inside one directory.
//! It is recomputed from disk on every call and never cached.

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, SelectionError};

/// File extensions accepted as profile images (compared case-insensitively)
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png"];

/// Eligible image files in a single directory
#[derive(Debug, Clone)]
pub struct ImagePool {
    dir: PathBuf,
}

impl ImagePool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fail with `DirectoryNotFound` unless the pool directory exists
    pub fn ensure_exists(&self) -> Result<()> {
        if !self.dir.is_dir() {
            return Err(SelectionError::DirectoryNotFound(self.dir.clone()).into());
        }
        Ok(())
    }

    /// List eligible file names in filesystem enumeration order
    ///
    /// Only direct entries are considered. Subdirectories are ignored even
    /// when their names carry an image extension.
    pub fn list_eligible(&self) -> Result<Vec<String>> {
        self.ensure_exists()?;

        let mut images = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(SelectionError::Io)? {
            let entry = entry.map_err(SelectionError::Io)?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::debug!(
                        "Skipping non UTF-8 file name {:?} in {}",
                        raw,
                        self.dir.display()
                    );
                    continue;
                }
            };
            if is_image_name(&name) && entry.path().is_file() {
                images.push(name);
            }
        }

        Ok(images)
    }

    /// Whether `name` is currently an eligible image of this pool
    ///
    /// `name` must be a bare file name; anything reaching outside the pool
    /// directory or into a subdirectory is not a member.
    pub fn contains(&self, name: &str) -> bool {
        is_bare_file_name(name) && is_image_name(name) && self.dir.join(name).is_file()
    }
}

fn is_bare_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Whether a file name carries one of the accepted image extensions
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfcycleError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_image_name() {
        assert!(is_image_name("a.png"));
        assert!(is_image_name("a.PNG"));
        assert!(is_image_name("photo.Jpeg"));
        assert!(is_image_name("x.jpg"));
        assert!(!is_image_name("anim.gif"));
        assert!(!is_image_name("notes.txt"));
        assert!(!is_image_name("png"));
        assert!(!is_image_name(".pending-shuffle.txt"));
    }

    #[test]
    fn test_list_eligible_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.png", "b.JPG", "c.jpeg", "d.gif", "readme.md"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }

        let pool = ImagePool::new(temp_dir.path());
        let mut images = pool.list_eligible().unwrap();
        images.sort();

        assert_eq!(images, vec!["a.png", "b.JPG", "c.jpeg"]);
    }

    #[test]
    fn test_list_eligible_ignores_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("album.png")).unwrap();
        fs::write(temp_dir.path().join("real.png"), b"x").unwrap();

        let pool = ImagePool::new(temp_dir.path());
        assert_eq!(pool.list_eligible().unwrap(), vec!["real.png"]);
    }

    #[test]
    fn test_list_eligible_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let pool = ImagePool::new(temp_dir.path());
        assert!(pool.list_eligible().unwrap().is_empty());
    }

    #[test]
    fn test_list_eligible_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let pool = ImagePool::new(temp_dir.path().join("missing"));

        match pool.list_eligible() {
            Err(ProfcycleError::Selection(SelectionError::DirectoryNotFound(path))) => {
                assert!(path.ends_with("missing"));
            }
            other => panic!("Expected DirectoryNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_contains() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.png"), b"x").unwrap();

        let pool = ImagePool::new(temp_dir.path());
        assert!(pool.contains("a.png"));
        assert!(!pool.contains("b.png"));
    }

    #[test]
    fn test_contains_rejects_paths_outside_pool() {
        let temp_dir = TempDir::new().unwrap();
        let pool_dir = temp_dir.path().join("icons");
        fs::create_dir_all(pool_dir.join("sub")).unwrap();
        fs::write(temp_dir.path().join("secret.png"), b"x").unwrap();
        fs::write(pool_dir.join("sub").join("x.png"), b"x").unwrap();
        fs::write(pool_dir.join("a.png"), b"x").unwrap();

        let pool = ImagePool::new(&pool_dir);
        assert!(pool.contains("a.png"));
        assert!(!pool.contains("../secret.png"));
        assert!(!pool.contains("sub/x.png"));
        assert!(!pool.contains("./a.png"));
        assert!(!pool.contains(&temp_dir.path().join("secret.png").to_string_lossy()));
    }

    #[test]
    fn test_contains_rejects_non_images() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(temp_dir.path().join("album.png")).unwrap();

        let pool = ImagePool::new(temp_dir.path());
        assert!(!pool.contains("notes.txt"));
        assert!(!pool.contains("album.png"));
    }
}
