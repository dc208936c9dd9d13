use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::Result;

/// Read access to a set of files addressed by bundle-relative paths
/// (forward slashes, no leading slash).
pub trait AssetBundle: Send + Sync {
    fn file_exists(&self, path: &str) -> bool;

    fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Paths starting with `prefix`, sorted.
    fn enumerate_files(&self, prefix: &str) -> Vec<String>;
}

fn not_found(path: &str) -> crate::errors::LimeError {
    std::io::Error::new(std::io::ErrorKind::NotFound, format!("'{path}' not found in bundle")).into()
}

/// Bundle backed by a directory on disk.
pub struct DirectoryBundle {
    root_path: PathBuf,
}

impl DirectoryBundle {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            root_path: path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn collect(&self, dir: &Path, out: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                self.collect(&path, out);
            } else if let Ok(relative) = path.strip_prefix(&self.root_path) {
                out.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
    }
}

impl AssetBundle for DirectoryBundle {
    fn file_exists(&self, path: &str) -> bool {
        self.root_path.join(path).is_file()
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.root_path.join(path))?)
    }

    fn enumerate_files(&self, prefix: &str) -> Vec<String> {
        let mut files = Vec::new();
        self.collect(&self.root_path, &mut files);
        files.retain(|f| f.starts_with(prefix));
        files.sort();
        files
    }
}

/// In-memory bundle, handy for tools and tests.
#[derive(Default)]
pub struct MemoryBundle {
    files: RwLock<FxHashMap<String, Vec<u8>>>,
}

impl MemoryBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.write().insert(path.into(), data.into());
    }

    /// Serializes `value` as JSON into `path`.
    pub fn insert_json<T: serde::Serialize>(&self, path: impl Into<String>, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)?;
        self.insert(path, data);
        Ok(())
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.files.write().remove(path)
    }
}

impl AssetBundle for MemoryBundle {
    fn file_exists(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.files.read().get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn enumerate_files(&self, prefix: &str) -> Vec<String> {
        let mut files: Vec<String> = self
            .files
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        files.sort();
        files
    }
}
