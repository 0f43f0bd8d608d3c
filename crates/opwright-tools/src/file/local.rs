use super::security::{is_project_root, resolve_in_root, SNAPSHOT_SKIP_DIRS};
use super::store::{FileStore, ProjectFile};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Files larger than this are left out of snapshots.
const MAX_SNAPSHOT_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Disk-backed file store rooted at a project directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Create a store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        resolve_in_root(&self.root, path)
    }
}

#[async_trait::async_trait]
impl FileStore for LocalFileStore {
    async fn write(&self, path: &str, content: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content).await?;
        debug!(path = %path, bytes = content.len(), "File written");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        let meta = tokio::fs::metadata(&target).await?;
        if meta.is_dir() {
            return Err(Error::InvalidInput(format!(
                "'{}' is a folder, use folder deletion instead",
                path
            )));
        }
        tokio::fs::remove_file(&target).await?;
        debug!(path = %path, "File deleted");
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let dest = self.resolve(to)?;
        if is_project_root(&self.root, &source) {
            return Err(Error::PermissionDenied(
                "the project root cannot be moved".to_string(),
            ));
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&source, &dest).await?;
        debug!(from = %from, to = %to, "Path renamed");
        Ok(())
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        tokio::fs::create_dir_all(&target).await?;
        debug!(path = %path, "Folder created");
        Ok(())
    }

    async fn remove_dir(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if is_project_root(&self.root, &target) {
            warn!(path = %path, "Refusing to delete the project root");
            return Err(Error::PermissionDenied(
                "the project root cannot be deleted".to_string(),
            ));
        }
        tokio::fs::remove_dir_all(&target).await?;
        debug!(path = %path, "Folder deleted");
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<ProjectFile>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || collect_files(&root))
            .await
            .map_err(|e| Error::Execution(format!("snapshot task failed: {}", e)))?
    }
}

fn collect_files(root: &Path) -> Result<Vec<ProjectFile>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !(entry.file_type().is_dir()
                && SNAPSHOT_SKIP_DIRS
                    .iter()
                    .any(|skip| entry.file_name() == std::ffi::OsStr::new(skip)))
    });

    for entry in walker {
        let entry = entry.map_err(|e| Error::Execution(format!("failed to walk project: {}", e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        if size > MAX_SNAPSHOT_FILE_BYTES {
            warn!(path = %entry.path().display(), size, "Skipping oversized file");
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| Error::Execution("walked outside the project root".to_string()))?;
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(ProjectFile {
            path,
            data: std::fs::read(entry.path())?,
        });
    }
    Ok(files)
}
