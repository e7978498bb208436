//! Batch result contract.
//!
//! [`ApplyVersionResults`] is the sole output of the engine: an ordered
//! list of per-component successes and a separate list of failures. The
//! aggregation step is pure data shaping -- no I/O, no decisions -- so
//! presentation layers can render it without any other engine state.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::component::{ComponentId, Version};
use crate::errors::CheckoutError;
use crate::merge::engine::MergeAction;

// ---------------------------------------------------------------------------
// Per-component results
// ---------------------------------------------------------------------------

/// Overall status of one component's checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    /// Every file resolved cleanly (strategy-resolved conflicts count as
    /// clean: no markers remain).
    Succeeded,
    /// At least one file was left with conflict markers.
    SucceededWithConflicts,
    /// The checkout did not complete for this component.
    Failed(String),
}

/// One file's recorded outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub action: MergeAction,
}

/// The result of checking out a single component.
///
/// Created fresh per invocation and immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheckoutResult {
    /// The component, pinned to the version that was applied.
    pub id: ComponentId,
    /// The concrete version the working copy now reflects. Under a
    /// `Latest` directive different components report different versions.
    pub applied_version: Version,
    /// Per-file outcomes, in path order.
    pub files: Vec<FileOutcome>,
    pub status: CheckoutStatus,
    pub completed_at: DateTime<Utc>,
}

impl ComponentCheckoutResult {
    /// Paths still carrying conflict markers.
    pub fn conflicted_paths(&self) -> Vec<&PathBuf> {
        self.files
            .iter()
            .filter(|f| f.action.is_conflicted())
            .map(|f| &f.path)
            .collect()
    }
}

/// A component the batch could not check out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedComponent {
    pub id: ComponentId,
    pub failure_message: String,
}

// ---------------------------------------------------------------------------
// Batch result
// ---------------------------------------------------------------------------

/// The batch-level outcome consumed by presentation layers.
///
/// Invariant: a given component id appears in exactly one of the two
/// lists, never both, and never more than once. Both lists preserve the
/// batch's input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyVersionResults {
    pub components: Vec<ComponentCheckoutResult>,
    pub failed_components: Vec<FailedComponent>,
}

impl ApplyVersionResults {
    /// Partition per-component outcomes into the success / failure lists.
    ///
    /// `outcomes` must be in input-id order; that order is preserved.
    /// Duplicate ids are dropped (first occurrence wins) to uphold the
    /// one-entry-per-component invariant.
    pub fn aggregate(
        outcomes: Vec<(ComponentId, Result<ComponentCheckoutResult, CheckoutError>)>,
    ) -> Self {
        let mut results = Self::default();
        let mut seen: Vec<ComponentId> = Vec::new();

        for (id, outcome) in outcomes {
            let bare = ComponentId::new(id.scope.clone(), id.name.clone());
            if seen.contains(&bare) {
                warn!(component = %id, "duplicate component id in batch, dropping");
                continue;
            }
            seen.push(bare);

            match outcome {
                Ok(result) => {
                    if let CheckoutStatus::Failed(reason) = &result.status {
                        results.failed_components.push(FailedComponent {
                            id,
                            failure_message: reason.clone(),
                        });
                    } else {
                        results.components.push(result);
                    }
                }
                Err(err) => {
                    results.failed_components.push(FailedComponent {
                        id,
                        failure_message: err.to_string(),
                    });
                }
            }
        }

        results
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_components.is_empty()
    }

    /// Total components that finished with marker-bearing files.
    pub fn conflicted_count(&self) -> usize {
        self.components
            .iter()
            .filter(|c| c.status == CheckoutStatus::SucceededWithConflicts)
            .count()
    }
}
