//! Conflict resolution strategies.
//!
//! Takes the `Conflicted` outcomes from the merge engine and applies the
//! invocation's [`MergeStrategy`]: keep local (`Ours`), take target
//! (`Theirs`), leave markers (`Manual` / `Unspecified`), or ask an
//! external prompt per file (`ManualInteractive`).

use std::path::Path;

use tracing::{debug, info, warn};

use crate::component::{ComponentId, MergeStrategy};
use crate::errors::PromptError;
use crate::merge::engine::{MergeAction, MergedFile};

// ---------------------------------------------------------------------------
// Prompt seam
// ---------------------------------------------------------------------------

/// A per-file answer from the interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    /// Keep the local modification for this file.
    Ours,
    /// Take the target version for this file.
    Theirs,
    /// Leave the markers in place for this file.
    Manual,
}

/// External collaborator consulted under `ManualInteractive`.
///
/// This is a cooperative suspension point: it blocks only the component
/// being resolved, never its batch siblings. Non-interactive
/// implementations return [`PromptError::Unavailable`], which degrades
/// the remaining files to manual resolution.
pub trait ResolutionPrompt: Send + Sync {
    fn ask_file_resolution(
        &self,
        id: &ComponentId,
        path: &Path,
        conflict_preview: &str,
    ) -> Result<PromptAnswer, PromptError>;
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Counts of what the resolver did for one component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    /// Conflicts settled by a strategy (content has no markers left).
    pub resolved: usize,
    /// Conflicts left with markers for out-of-band resolution.
    pub unresolved: usize,
}

impl ResolutionSummary {
    /// Whether the component finished with marker-bearing files.
    pub fn has_unresolved(&self) -> bool {
        self.unresolved > 0
    }
}

/// Stateless strategy application over a component's merged files.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Apply `strategy` to every conflicted file in `files`, in place.
    ///
    /// Files that are not conflicted are untouched. Under
    /// `ManualInteractive` each conflicted file gets its own prompt, so a
    /// single component may end up with a mixture of resolutions; if the
    /// prompt is unavailable the remaining files degrade to manual.
    pub fn resolve(
        id: &ComponentId,
        files: &mut [MergedFile],
        strategy: MergeStrategy,
        prompt: Option<&dyn ResolutionPrompt>,
    ) -> ResolutionSummary {
        let mut summary = ResolutionSummary::default();
        let mut prompt = prompt;

        for file in files.iter_mut().filter(|f| f.action.is_conflicted()) {
            match strategy {
                MergeStrategy::Ours => {
                    Self::take_side(file, MergeStrategy::Ours);
                    summary.resolved += 1;
                }
                MergeStrategy::Theirs => {
                    Self::take_side(file, MergeStrategy::Theirs);
                    summary.resolved += 1;
                }
                MergeStrategy::Manual | MergeStrategy::Unspecified => {
                    // Markers stay; the user edits the file out-of-band.
                    summary.unresolved += 1;
                }
                MergeStrategy::ManualInteractive => {
                    match Self::ask(id, file, prompt) {
                        Some(PromptAnswer::Ours) => {
                            Self::take_side(file, MergeStrategy::Ours);
                            summary.resolved += 1;
                        }
                        Some(PromptAnswer::Theirs) => {
                            Self::take_side(file, MergeStrategy::Theirs);
                            summary.resolved += 1;
                        }
                        Some(PromptAnswer::Manual) => {
                            summary.unresolved += 1;
                        }
                        None => {
                            // Prompt gone; stop asking for this component.
                            prompt = None;
                            summary.unresolved += 1;
                        }
                    }
                }
            }
        }

        info!(
            component = %id,
            strategy = %strategy,
            resolved = summary.resolved,
            unresolved = summary.unresolved,
            "conflict resolution complete"
        );
        summary
    }

    fn ask(
        id: &ComponentId,
        file: &MergedFile,
        prompt: Option<&dyn ResolutionPrompt>,
    ) -> Option<PromptAnswer> {
        let prompt = prompt?;
        let preview = file.content.as_deref().unwrap_or_default();
        match prompt.ask_file_resolution(id, &file.path, preview) {
            Ok(answer) => {
                debug!(component = %id, path = %file.path.display(), ?answer, "prompt answered");
                Some(answer)
            }
            Err(e) => {
                warn!(
                    component = %id,
                    path = %file.path.display(),
                    error = %e,
                    "interactive prompt unavailable, degrading to manual"
                );
                None
            }
        }
    }

    /// Replace a conflicted file's content with the chosen side.
    ///
    /// `Ours` with a locally-deleted file keeps the deletion; `Theirs`
    /// with a target-deleted file applies the deletion.
    fn take_side(file: &mut MergedFile, winner: MergeStrategy) {
        let sides = file.sides.take().unwrap_or_else(|| {
            // A conflicted file always carries its sides; treat a missing
            // pair as both-deleted so resolution still terminates.
            crate::merge::engine::ConflictSides {
                local: None,
                target: None,
            }
        });
        file.content = match winner {
            MergeStrategy::Ours => sides.local,
            _ => sides.target,
        };
        file.action = MergeAction::ResolvedByStrategy(winner);
    }
}
