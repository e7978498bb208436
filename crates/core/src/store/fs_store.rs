//! Filesystem-backed version store and workspace.
//!
//! On-disk layout, rooted at the store directory:
//!
//! ```text
//! components/<scope>/<name>/component.json      version list, publication order
//! components/<scope>/<name>/versions/<v>/...    published file snapshots
//! workspace/<scope>/<name>/...                  the mutable working copy
//! workspace/<scope>/<name>/.compvc-base         recorded base version
//! ```
//!
//! Published snapshots are immutable once written; only the workspace
//! side mutates, and every file write goes through an atomic
//! replace-on-write so a crash never leaves a half-written file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::component::{ComponentId, Version};
use crate::errors::StoreError;
use crate::snapshot::FileSnapshot;
use crate::store::{VersionStore, Workspace};

/// Marker file inside each working copy recording its base version.
const BASE_MARKER: &str = ".compvc-base";

/// Per-component metadata record (`component.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ComponentRecord {
    /// Version labels in publication order; the last entry is the latest.
    versions: Vec<String>,
}

/// Filesystem store implementing both [`VersionStore`] and [`Workspace`].
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (or lazily create) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn component_dir(&self, id: &ComponentId) -> PathBuf {
        self.root.join("components").join(&id.scope).join(&id.name)
    }

    fn version_dir(&self, id: &ComponentId, version: &Version) -> PathBuf {
        self.component_dir(id).join("versions").join(version.as_str())
    }

    fn workspace_dir(&self, id: &ComponentId) -> PathBuf {
        self.root.join("workspace").join(&id.scope).join(&id.name)
    }

    fn read_record(&self, id: &ComponentId) -> Result<ComponentRecord, StoreError> {
        let path = self.component_dir(id).join("component.json");
        if !path.exists() {
            return Err(StoreError::ComponentNotFound(id.to_string_without_version()));
        }
        let raw = fs::read_to_string(&path)?;
        serde_json::from_str(&raw).map_err(|e| StoreError::CorruptMetadata {
            component: id.to_string_without_version(),
            detail: e.to_string(),
        })
    }

    fn write_record(&self, id: &ComponentId, record: &ComponentRecord) -> Result<(), StoreError> {
        let dir = self.component_dir(id);
        fs::create_dir_all(&dir)?;
        let raw = serde_json::to_string_pretty(record).map_err(|e| StoreError::CorruptMetadata {
            component: id.to_string_without_version(),
            detail: e.to_string(),
        })?;
        atomic_write(&dir.join("component.json"), &raw)?;
        Ok(())
    }

    /// Publish a snapshot as a new version of `id`.
    ///
    /// Appends the version to the component's record (creating the
    /// component if needed), so publication order defines "latest".
    pub fn publish(
        &self,
        id: &ComponentId,
        version: &Version,
        snapshot: &FileSnapshot,
    ) -> Result<(), StoreError> {
        let mut record = match self.read_record(id) {
            Ok(record) => record,
            Err(StoreError::ComponentNotFound(_)) => ComponentRecord { versions: vec![] },
            Err(e) => return Err(e),
        };

        let dir = self.version_dir(id, version);
        fs::create_dir_all(&dir)?;
        for (path, content) in snapshot.iter() {
            let file_path = dir.join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent)?;
            }
            atomic_write(&file_path, &content.text)?;
        }

        if !record.versions.iter().any(|v| v == version.as_str()) {
            record.versions.push(version.as_str().to_string());
        }
        self.write_record(id, &record)?;

        info!(component = %id, version = %version, files = snapshot.len(), "published version");
        Ok(())
    }

    /// Materialize a working copy of `id` at `version` and record it as base.
    pub fn init_working_copy(&self, id: &ComponentId, version: &Version) -> Result<(), StoreError> {
        let snapshot = self.snapshot(id, version)?;
        let dir = self.workspace_dir(id);
        fs::create_dir_all(&dir)?;
        for (path, content) in snapshot.iter() {
            self.write_file(id, path, &content.text)?;
        }
        self.set_base_version(id, version)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// VersionStore impl
// ---------------------------------------------------------------------------

impl VersionStore for FsStore {
    fn snapshot(&self, id: &ComponentId, version: &Version) -> Result<FileSnapshot, StoreError> {
        let record = self.read_record(id)?;
        if !record.versions.iter().any(|v| v == version.as_str()) {
            return Err(StoreError::VersionNotFound {
                component: id.to_string_without_version(),
                version: version.to_string(),
            });
        }
        let dir = self.version_dir(id, version);
        let snapshot = read_tree(&dir, &dir)?;
        debug!(component = %id, version = %version, files = snapshot.len(), "loaded snapshot");
        Ok(snapshot)
    }

    fn base_version(&self, id: &ComponentId) -> Result<Version, StoreError> {
        let marker = self.workspace_dir(id).join(BASE_MARKER);
        if !marker.exists() {
            return Err(StoreError::NoBaseVersion(id.to_string_without_version()));
        }
        let raw = fs::read_to_string(&marker)?;
        Ok(Version::new(raw.trim()))
    }

    fn resolve_latest(&self, id: &ComponentId) -> Result<Version, StoreError> {
        let record = self.read_record(id)?;
        record
            .versions
            .last()
            .map(|v| Version::new(v.clone()))
            .ok_or_else(|| StoreError::VersionNotFound {
                component: id.to_string_without_version(),
                version: "latest".into(),
            })
    }

    fn list_components(&self) -> Result<Vec<ComponentId>, StoreError> {
        let components_dir = self.root.join("components");
        let mut ids = Vec::new();
        if !components_dir.exists() {
            return Ok(ids);
        }
        for scope_entry in fs::read_dir(&components_dir)? {
            let scope_entry = scope_entry?;
            if !scope_entry.file_type()?.is_dir() {
                continue;
            }
            let scope = scope_entry.file_name().to_string_lossy().into_owned();
            for name_entry in fs::read_dir(scope_entry.path())? {
                let name_entry = name_entry?;
                if !name_entry.file_type()?.is_dir() {
                    continue;
                }
                let name = name_entry.file_name().to_string_lossy().into_owned();
                ids.push(ComponentId::new(scope.clone(), name));
            }
        }
        ids.sort_by_key(|id| id.to_string_without_version());
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// Workspace impl
// ---------------------------------------------------------------------------

impl Workspace for FsStore {
    fn read_working_copy(&self, id: &ComponentId) -> Result<FileSnapshot, StoreError> {
        let dir = self.workspace_dir(id);
        if !dir.exists() {
            return Ok(FileSnapshot::new());
        }
        read_tree(&dir, &dir)
    }

    fn write_file(&self, id: &ComponentId, path: &Path, content: &str) -> Result<(), StoreError> {
        let file_path = self.workspace_dir(id).join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&file_path, content)?;
        Ok(())
    }

    fn remove_file(&self, id: &ComponentId, path: &Path) -> Result<(), StoreError> {
        let file_path = self.workspace_dir(id).join(path);
        match fs::remove_file(&file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn set_base_version(&self, id: &ComponentId, version: &Version) -> Result<(), StoreError> {
        let dir = self.workspace_dir(id);
        fs::create_dir_all(&dir)?;
        atomic_write(&dir.join(BASE_MARKER), version.as_str())?;
        debug!(component = %id, base = %version, "recorded base version");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically: temp file in the same directory,
/// then rename over the destination.
fn atomic_write(path: &Path, content: &str) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::Io(std::io::Error::other("path has no parent directory")))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path)
        .map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Recursively read a directory tree into a snapshot of relative paths.
///
/// The base-version marker is workspace bookkeeping, not content, and is
/// excluded.
fn read_tree(root: &Path, dir: &Path) -> Result<FileSnapshot, StoreError> {
    let mut snapshot = FileSnapshot::new();
    collect_tree(root, dir, &mut snapshot)?;
    Ok(snapshot)
}

fn collect_tree(root: &Path, dir: &Path, snapshot: &mut FileSnapshot) -> Result<(), StoreError> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_tree(root, &path, snapshot)?;
        } else {
            if entry.file_name().to_string_lossy() == BASE_MARKER {
                continue;
            }
            let rel = path
                .strip_prefix(root)
                .map_err(|_| StoreError::Io(std::io::Error::other("path outside tree root")))?;
            let content = fs::read_to_string(&path)?;
            snapshot.insert(rel, content);
        }
    }
    Ok(())
}
