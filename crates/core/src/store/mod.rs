//! Version store and working-copy access.
//!
//! The engine talks to two narrow seams:
//! 1. [`VersionStore`] -- read-only access to published snapshots and
//!    version metadata.
//! 2. [`Workspace`] -- the mutable, per-component working copy.
//!
//! Transient I/O failures at this boundary are retried with bounded
//! backoff via [`with_retry`]; semantic failures (missing component or
//! version) surface immediately.

pub mod fs_store;

use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::component::{ComponentId, Version};
use crate::errors::StoreError;
use crate::snapshot::FileSnapshot;

pub use fs_store::FsStore;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read-only access to published component snapshots.
///
/// Implementations must be safe to share across concurrent component
/// pipelines; nothing here mutates store state.
pub trait VersionStore: Send + Sync {
    /// The file snapshot of `id` at `version`.
    fn snapshot(&self, id: &ComponentId, version: &Version) -> Result<FileSnapshot, StoreError>;

    /// The version the working copy of `id` was last checked out from.
    fn base_version(&self, id: &ComponentId) -> Result<Version, StoreError>;

    /// The newest known version of `id`.
    fn resolve_latest(&self, id: &ComponentId) -> Result<Version, StoreError>;

    /// All tracked component ids (no version), in stable order.
    fn list_components(&self) -> Result<Vec<ComponentId>, StoreError>;
}

/// Mutable access to a component's working copy.
///
/// Working copies are partitioned by component directory, so concurrent
/// writers for different components never touch the same files.
pub trait Workspace: Send + Sync {
    /// Read the current working copy of `id` as a snapshot.
    fn read_working_copy(&self, id: &ComponentId) -> Result<FileSnapshot, StoreError>;

    /// Atomically write one working-copy file (replace-on-write).
    fn write_file(&self, id: &ComponentId, path: &Path, content: &str) -> Result<(), StoreError>;

    /// Remove one working-copy file. Removing an absent file is a no-op.
    fn remove_file(&self, id: &ComponentId, path: &Path) -> Result<(), StoreError>;

    /// Record the version the working copy is now based on.
    fn set_base_version(&self, id: &ComponentId, version: &Version) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// Maximum attempts for a store operation before the error surfaces.
const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff delay; doubles after each failed attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

/// Run a store operation, retrying transient I/O failures.
///
/// Semantic errors (`ComponentNotFound`, `VersionNotFound`, ...) are
/// returned on the first occurrence. `label` names the operation for
/// log output.
pub async fn with_retry<T, F>(label: &str, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Result<T, StoreError>,
{
    let mut delay = INITIAL_BACKOFF;
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
                warn!(
                    operation = label,
                    attempt,
                    error = %err,
                    "transient store error, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => {
                debug!(operation = label, attempt, error = %err, "store operation failed");
                return Err(err);
            }
        }
    }
}
