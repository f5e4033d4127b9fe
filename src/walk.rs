//! Directory enumeration
//!
//! Produces the lazy, finite sequence of regular files below a root:
//! - The root is validated eagerly; an invalid root fails before any path
//!   is yielded
//! - Directories, devices, sockets, and broken links are excluded; a
//!   symlink whose target is a regular file is yielded, symlinks to
//!   directories are not followed
//! - Unreadable directories encountered mid-walk are logged and skipped
//! - Each call to [`FileEnumerator::iter`] re-walks from the root, so the
//!   sequence is restartable but a single iterator is not shareable across
//!   consumers

use crate::error::{HashWalkerError, RootErrorKind};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Lazily enumerates regular files below a validated root
#[derive(Debug, Clone)]
pub struct FileEnumerator {
    root: PathBuf,
    exclude_patterns: Vec<Regex>,
}

impl FileEnumerator {
    /// Validate the root and create an enumerator
    ///
    /// Fails with `InvalidRoot` if the root does not exist (or cannot be
    /// stat'd) or is not a directory. Nothing is walked until `iter`.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, HashWalkerError> {
        let root = root.as_ref().to_path_buf();

        let meta = fs::metadata(&root).map_err(|_| HashWalkerError::InvalidRoot {
            path: root.clone(),
            kind: RootErrorKind::Missing,
        })?;

        if !meta.is_dir() {
            return Err(HashWalkerError::InvalidRoot {
                path: root,
                kind: RootErrorKind::NotADirectory,
            });
        }

        Ok(Self {
            root,
            exclude_patterns: Vec::new(),
        })
    }

    /// Attach exclusion patterns
    ///
    /// Matching paths are neither yielded nor descended into.
    pub fn with_excludes(mut self, patterns: Vec<Regex>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if a path matches any exclusion pattern
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let text = path.to_string_lossy();
        self.exclude_patterns.iter().any(|re| re.is_match(&text))
    }

    /// Walk the tree, yielding every regular file
    ///
    /// Iteration order is the traversal order of the walk: unspecified but
    /// stable for an unchanged tree. Each call walks independently.
    pub fn iter(&self) -> impl Iterator<Item = PathBuf> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded(entry.path()))
            .filter_map(move |entry| match entry {
                Ok(entry) => self.resolve(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    None
                }
            })
    }

    /// Keep regular files; resolve symlinks that point at regular files
    fn resolve(&self, entry: walkdir::DirEntry) -> Option<PathBuf> {
        let file_type = entry.file_type();
        if file_type.is_file() {
            return Some(entry.into_path());
        }
        if file_type.is_symlink() {
            let path = entry.into_path();
            // fs::metadata follows the link; broken links and linked
            // directories fall through to None
            if let Ok(meta) = fs::metadata(&path) {
                if meta.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }
}
