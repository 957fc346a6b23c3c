use std::path::{Path, PathBuf};

use crate::http::request::Request;

/// An opened file ready to be streamed.
#[derive(Debug)]
pub struct File {
    path: PathBuf,
    size: u64,
    handle: tokio::fs::File,
}

impl File {
    /// Opens `path` as a regular file.
    pub fn open(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let handle = std::fs::File::open(&path).ok()?;
        let metadata = handle.metadata().ok()?;
        if !metadata.is_file() {
            return None;
        }

        Some(Self {
            path,
            size: metadata.len(),
            handle: tokio::fs::File::from_std(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn into_handle(self) -> tokio::fs::File {
        self.handle
    }
}

/// Maps a parsed request to a file on disk.
///
/// Implementations do not have to guard against traversal: the session
/// re-checks the canonical path of whatever is returned against the root.
pub trait FileResolver: Send + Sync {
    fn resolve(&self, request: &Request) -> Option<File>;
}

/// Serves files below a single root directory, `index.html` for directories.
#[derive(Debug, Clone)]
pub struct RootFileResolver {
    root: PathBuf,
}

impl RootFileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidate(&self, path: &str) -> PathBuf {
        let mut candidate = self.root.join(path.trim_start_matches('/'));
        if path.ends_with('/') || candidate.is_dir() {
            candidate.push("index.html");
        }
        candidate
    }
}

impl FileResolver for RootFileResolver {
    fn resolve(&self, request: &Request) -> Option<File> {
        File::open(self.candidate(&request.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_maps_to_index() {
        let resolver = RootFileResolver::new("/srv/www");
        assert_eq!(resolver.candidate("/"), PathBuf::from("/srv/www/index.html"));
        assert_eq!(
            resolver.candidate("/docs/"),
            PathBuf::from("/srv/www/docs/index.html")
        );
        assert_eq!(
            resolver.candidate("/a/b.css"),
            PathBuf::from("/srv/www/a/b.css")
        );
    }
}
