//! Working directory operations
//!
//! The workspace wraps the repository's working directory root and exposes
//! the primitives the diff engine needs: directory listings, lstat-style
//! metadata, file/symlink content, and absolute path resolution.

use crate::artifacts::index::index_entry::EntryMetadata;
use crate::artifacts::objects::blob::Blob;
use anyhow::Context;
use std::path::{Path, PathBuf};

const IGNORED_PATHS: [&str; 3] = [".git", ".", ".."];

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute filesystem path of a workspace-relative path
    pub fn absolute_path(&self, rel_path: &Path) -> PathBuf {
        self.path.join(rel_path)
    }

    pub fn exists(&self, rel_path: &Path) -> bool {
        self.absolute_path(rel_path).exists()
    }

    /// Read a workspace file as a blob
    ///
    /// A symlink becomes a blob holding the link target.
    pub fn parse_blob(&self, rel_path: &Path) -> anyhow::Result<Blob> {
        let metadata = self.stat_file(rel_path)?;

        let data = if metadata.mode.is_symlink() {
            self.read_link(rel_path)?
        } else {
            self.read_file(rel_path)?
        };

        Ok(Blob::new(data))
    }

    /// List the children of a directory, as workspace-relative paths
    ///
    /// The `.git` directory is never listed. The order is whatever the
    /// filesystem delivers; callers impose their own sort discipline.
    pub fn list_dir(&self, dir_path: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let dir_path = match dir_path {
            Some(p) => self.path.join(p),
            None => self.path.clone().into(),
        };

        if !dir_path.exists() {
            anyhow::bail!("The specified path does not exist: {:?}", dir_path);
        }

        if dir_path.is_dir() {
            Ok(std::fs::read_dir(&dir_path)?
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| self.check_if_not_ignored_path(&entry.path()))
                .collect::<Vec<_>>())
        } else {
            anyhow::bail!("The specified path is not a directory: {:?}", dir_path);
        }
    }

    fn is_ignored(path: &Path) -> bool {
        // Check if any component of the path is in IGNORED_PATHS
        path.components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                let name_str = name.to_string_lossy();
                IGNORED_PATHS.contains(&name_str.as_ref())
            } else {
                false
            }
        })
    }

    fn check_if_not_ignored_path(&self, path: &Path) -> Option<PathBuf> {
        if !Self::is_ignored(path) {
            Some(path.strip_prefix(self.path.as_ref()).ok()?.to_path_buf())
        } else {
            None
        }
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<String> {
        let file_path = self.path.join(file_path);

        let content = std::fs::read_to_string(&file_path)
            .with_context(|| format!("Unable to read file {}", file_path.display()))?;

        Ok(content)
    }

    pub fn read_bytes(&self, file_path: &Path) -> anyhow::Result<Vec<u8>> {
        let file_path = self.path.join(file_path);

        std::fs::read(&file_path)
            .with_context(|| format!("Unable to read file {}", file_path.display()))
    }

    /// Read the target of a symbolic link
    pub fn read_link(&self, file_path: &Path) -> anyhow::Result<String> {
        let file_path = self.path.join(file_path);

        let target = std::fs::read_link(&file_path)
            .with_context(|| format!("Unable to read link {}", file_path.display()))?;

        target
            .to_str()
            .map(String::from)
            .ok_or_else(|| anyhow::anyhow!("Invalid link target {}", target.display()))
    }

    /// Stat a workspace entry without following symlinks
    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<EntryMetadata> {
        let full_path = self.path.join(file_path);
        let metadata = std::fs::symlink_metadata(&full_path)
            .with_context(|| format!("Unable to stat {}", full_path.display()))?;

        (full_path.as_path(), metadata).try_into()
    }
}
