//! Working-copy modification detection.
//!
//! Compares per-file content hashes of the working copy against the base
//! snapshot (the version the component was last checked out from). Purely
//! read-only: the detector decides which checkout path runs, it never
//! writes anything.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::debug;

use crate::component::ComponentId;
use crate::errors::StoreError;
use crate::snapshot::FileSnapshot;
use crate::store::{VersionStore, Workspace};

/// Outcome of modification detection for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModificationStatus {
    /// Every working-copy file hash matches its base hash.
    Unmodified,
    /// At least one file diverges from base. The set is never empty.
    Modified(BTreeSet<PathBuf>),
    /// The working copy has no recorded base version.
    Untracked,
}

impl ModificationStatus {
    pub fn is_modified(&self) -> bool {
        matches!(self, Self::Modified(_))
    }
}

/// Stateless modification detector.
pub struct ModificationDetector;

impl ModificationDetector {
    /// Detect whether the working copy of `id` diverges from its base.
    ///
    /// A file counts as modified when it was edited, added, or removed
    /// relative to the base snapshot.
    pub fn detect<S>(store: &S, id: &ComponentId) -> Result<ModificationStatus, StoreError>
    where
        S: VersionStore + Workspace,
    {
        let base_version = match store.base_version(id) {
            Ok(v) => v,
            Err(StoreError::NoBaseVersion(_)) => {
                debug!(component = %id, "no base version, working copy untracked");
                return Ok(ModificationStatus::Untracked);
            }
            Err(e) => return Err(e),
        };

        let base = store.snapshot(id, &base_version)?;
        let local = store.read_working_copy(id)?;
        let changed = Self::diff_hashes(&base, &local);

        if changed.is_empty() {
            debug!(component = %id, base = %base_version, "working copy unmodified");
            Ok(ModificationStatus::Unmodified)
        } else {
            debug!(
                component = %id,
                base = %base_version,
                changed = changed.len(),
                "working copy modified"
            );
            Ok(ModificationStatus::Modified(changed))
        }
    }

    /// Paths whose hash differs between `base` and `local`, including
    /// files present on only one side.
    fn diff_hashes(base: &FileSnapshot, local: &FileSnapshot) -> BTreeSet<PathBuf> {
        let mut changed = BTreeSet::new();
        for path in base.union_paths(local) {
            match (base.get(path), local.get(path)) {
                (Some(b), Some(l)) if b.hash == l.hash => {}
                _ => {
                    changed.insert(path.clone());
                }
            }
        }
        changed
    }
}
