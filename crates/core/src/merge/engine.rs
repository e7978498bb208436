//! Three-way merge engine.
//!
//! Uses the `diffy` crate to perform line-based three-way merges between
//! the base snapshot, the local working copy, and the target version of a
//! file. File outcomes are evaluated independently; the engine never needs
//! cross-file context, so results are order-independent.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::MergeStrategy;
use crate::errors::MergeError;
use crate::snapshot::FileSnapshot;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single conflict region within merged output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictMarker {
    /// Starting line number (1-indexed) of the conflict marker block.
    pub start_line: usize,
    /// Ending line number (1-indexed) of the conflict marker block.
    pub end_line: usize,
}

/// How one file was resolved during checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeAction {
    /// Final content equals what was already in the working copy.
    Unchanged,
    /// Target taken verbatim: the local side had no changes (or the file
    /// is a pure addition / clean deletion from the target side).
    FastForwarded,
    /// Local and target changes combined without overlap.
    AutoMerged,
    /// Divergent regions overlap; content carries inline markers.
    Conflicted { markers: Vec<ConflictMarker> },
    /// A conflict settled by the named strategy.
    ResolvedByStrategy(MergeStrategy),
}

impl MergeAction {
    pub fn is_conflicted(&self) -> bool {
        matches!(self, Self::Conflicted { .. })
    }
}

/// The content of the two divergent sides of a conflict, kept so the
/// resolver can pick one without re-reading the store. `None` means the
/// side deleted the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictSides {
    pub local: Option<String>,
    pub target: Option<String>,
}

/// One file's merge result: the action taken and the content the working
/// copy should end up with (`None` = the file is absent after checkout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedFile {
    pub path: PathBuf,
    pub action: MergeAction,
    pub content: Option<String>,
    /// Populated only while `action` is `Conflicted`.
    pub sides: Option<ConflictSides>,
}

impl MergedFile {
    fn clean(path: &Path, action: MergeAction, content: Option<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            action,
            content,
            sides: None,
        }
    }

    fn conflicted(path: &Path, marked: String, sides: ConflictSides) -> Self {
        let markers = extract_markers(&marked);
        Self {
            path: path.to_path_buf(),
            action: MergeAction::Conflicted { markers },
            content: Some(marked),
            sides: Some(sides),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateless three-way merge engine.
pub struct MergeEngine;

impl MergeEngine {
    /// Merge every file in the union of `base`, `local`, and `target`.
    ///
    /// Returns one [`MergedFile`] per path, in path order.
    pub fn merge_snapshots(
        base: &FileSnapshot,
        local: &FileSnapshot,
        target: &FileSnapshot,
    ) -> Result<Vec<MergedFile>, MergeError> {
        let mut paths: Vec<&PathBuf> = base
            .paths()
            .chain(local.paths())
            .chain(target.paths())
            .collect();
        paths.sort();
        paths.dedup();

        paths
            .into_iter()
            .map(|path| {
                Self::merge_file(
                    path,
                    base.get(path).map(|c| c.text.as_str()),
                    local.get(path).map(|c| c.text.as_str()),
                    target.get(path).map(|c| c.text.as_str()),
                )
            })
            .collect()
    }

    /// Merge one file given up to three content blobs.
    ///
    /// Rules, in precedence order:
    /// 1. local == base, target == base: `Unchanged`.
    /// 2. local == base, target differs: `FastForwarded` (take target).
    /// 3. local differs, target == base: local edits kept, `Unchanged`.
    /// 4. both differ but converged (local == target): `Unchanged`.
    /// 5. both diverged: line-level merge; non-overlapping regions are
    ///    `AutoMerged`, overlapping regions `Conflicted` with markers.
    ///
    /// A file only present in target is a pure addition (`FastForwarded`);
    /// a file the target deletes is applied unless the local side modified
    /// it, which is a data-loss risk and therefore a conflict.
    pub fn merge_file(
        path: &Path,
        base: Option<&str>,
        local: Option<&str>,
        target: Option<&str>,
    ) -> Result<MergedFile, MergeError> {
        match (base, local, target) {
            (None, None, None) => Err(MergeError::EmptyTriple(path.display().to_string())),

            // Pure addition from the target side.
            (None, None, Some(t)) => Ok(MergedFile::clean(
                path,
                MergeAction::FastForwarded,
                Some(t.to_string()),
            )),

            // Local-only file: nothing to merge, local content stands.
            (None, Some(l), None) => Ok(MergedFile::clean(
                path,
                MergeAction::Unchanged,
                Some(l.to_string()),
            )),

            // Both sides added the same path independently.
            (None, Some(l), Some(t)) => {
                if l == t {
                    Ok(MergedFile::clean(
                        path,
                        MergeAction::Unchanged,
                        Some(l.to_string()),
                    ))
                } else {
                    debug!(path = %path.display(), "both sides added file with different content");
                    let marked = conflict_without_base(l, t);
                    Ok(MergedFile::conflicted(
                        path,
                        marked,
                        ConflictSides {
                            local: Some(l.to_string()),
                            target: Some(t.to_string()),
                        },
                    ))
                }
            }

            // Deleted on both sides (or base-only file gone everywhere).
            (Some(_), None, None) => {
                Ok(MergedFile::clean(path, MergeAction::Unchanged, None))
            }

            // Deleted locally; target kept or edited it.
            (Some(b), None, Some(t)) => {
                if t == b {
                    // Target did not touch it: the local deletion is a
                    // local edit to preserve.
                    Ok(MergedFile::clean(path, MergeAction::Unchanged, None))
                } else {
                    debug!(path = %path.display(), "target edited a locally-deleted file");
                    let marked = deletion_conflict(Some(b), None, Some(t));
                    Ok(MergedFile::conflicted(
                        path,
                        marked,
                        ConflictSides {
                            local: None,
                            target: Some(t.to_string()),
                        },
                    ))
                }
            }

            // Deleted in target; local kept or edited it.
            (Some(b), Some(l), None) => {
                if l == b {
                    // Clean deletion: local had no changes to lose.
                    Ok(MergedFile::clean(path, MergeAction::FastForwarded, None))
                } else {
                    debug!(path = %path.display(), "target deleted a locally-modified file");
                    let marked = deletion_conflict(Some(b), Some(l), None);
                    Ok(MergedFile::conflicted(
                        path,
                        marked,
                        ConflictSides {
                            local: Some(l.to_string()),
                            target: None,
                        },
                    ))
                }
            }

            // All three present: the standard three-way rules.
            (Some(b), Some(l), Some(t)) => Ok(Self::merge_triple(path, b, l, t)),
        }
    }

    fn merge_triple(path: &Path, base: &str, local: &str, target: &str) -> MergedFile {
        if local == base && target == base {
            return MergedFile::clean(path, MergeAction::Unchanged, Some(local.to_string()));
        }
        if local == base {
            debug!(path = %path.display(), "local == base, fast-forwarding to target");
            return MergedFile::clean(path, MergeAction::FastForwarded, Some(target.to_string()));
        }
        if target == base {
            // Local edits preserved, nothing to merge.
            return MergedFile::clean(path, MergeAction::Unchanged, Some(local.to_string()));
        }
        if local == target {
            debug!(path = %path.display(), "local and target converged");
            return MergedFile::clean(path, MergeAction::Unchanged, Some(local.to_string()));
        }

        // Both diverged from base and from each other.
        match diffy::merge(base, local, target) {
            Ok(merged) => {
                debug!(path = %path.display(), "auto-merged non-overlapping changes");
                MergedFile::clean(path, MergeAction::AutoMerged, Some(merged))
            }
            Err(marked) => {
                debug!(path = %path.display(), "overlapping changes, emitting conflict markers");
                MergedFile::conflicted(
                    path,
                    marked,
                    ConflictSides {
                        local: Some(local.to_string()),
                        target: Some(target.to_string()),
                    },
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Marker helpers
// ---------------------------------------------------------------------------

/// Locate conflict-marker blocks in merged output (1-indexed lines).
fn extract_markers(content: &str) -> Vec<ConflictMarker> {
    let mut markers = Vec::new();
    let mut start = None;
    for (i, line) in content.lines().enumerate() {
        if line.starts_with("<<<<<<<") {
            start = Some(i + 1);
        } else if line.starts_with(">>>>>>>") {
            if let Some(start_line) = start.take() {
                markers.push(ConflictMarker {
                    start_line,
                    end_line: i + 1,
                });
            }
        }
    }
    markers
}

/// Conflict output for an edit-vs-delete pair. The deleted side is an
/// empty block, matching diffy's `ours` / `original` / `theirs` labels.
fn deletion_conflict(base: Option<&str>, local: Option<&str>, target: Option<&str>) -> String {
    let mut out = String::from("<<<<<<< ours\n");
    if let Some(l) = local {
        push_block(&mut out, l);
    }
    if let Some(b) = base {
        out.push_str("||||||| original\n");
        push_block(&mut out, b);
    }
    out.push_str("=======\n");
    if let Some(t) = target {
        push_block(&mut out, t);
    }
    out.push_str(">>>>>>> theirs\n");
    out
}

/// Two-way conflict output when no base version exists for the file.
fn conflict_without_base(local: &str, target: &str) -> String {
    let mut out = String::from("<<<<<<< ours\n");
    push_block(&mut out, local);
    out.push_str("=======\n");
    push_block(&mut out, target);
    out.push_str(">>>>>>> theirs\n");
    out
}

fn push_block(out: &mut String, content: &str) {
    out.push_str(content);
    if !content.is_empty() && !content.ends_with('\n') {
        out.push('\n');
    }
}
