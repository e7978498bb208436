//! Three-way merging and conflict resolution.
//!
//! The merge subsystem is responsible for:
//! 1. **Merging** -- computing, per file, the outcome of combining the
//!    base snapshot, the local working copy, and the target version.
//! 2. **Resolution** -- applying the invocation's merge strategy to files
//!    the engine could not auto-resolve.

pub mod engine;
pub mod resolver;

pub use engine::{ConflictMarker, MergeAction, MergeEngine, MergedFile};
pub use resolver::{ConflictResolver, PromptAnswer, ResolutionPrompt, ResolutionSummary};
