//! Error types for the compvc core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

// ---------------------------------------------------------------------------
// Version store errors
// ---------------------------------------------------------------------------

/// Errors from the version store and working-copy boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The component is not tracked by the store.
    #[error("component '{0}' not found in the version store")]
    ComponentNotFound(String),

    /// The requested version does not exist for this component.
    #[error("version '{version}' not found for component '{component}'")]
    VersionNotFound {
        component: String,
        version: String,
    },

    /// The working copy has no recorded base version.
    #[error("no base version recorded for component '{0}'")]
    NoBaseVersion(String),

    /// Component metadata on disk could not be parsed.
    #[error("corrupt metadata for component '{component}': {detail}")]
    CorruptMetadata {
        component: String,
        detail: String,
    },

    /// Transient filesystem failure. Eligible for retry.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the error is transient and worth retrying.
    ///
    /// Semantic errors (missing component / version) are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from invocation configuration (flag normalization).
///
/// These are fatal for the whole invocation and are raised before any
/// component is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// More than one of the mutually-exclusive strategy flags was set.
    #[error("conflicting merge-strategy flags: {0}")]
    ConflictingStrategies(String),

    /// The interactive flag was combined with an explicit strategy flag.
    #[error("--interactive-merge cannot be combined with --{0}")]
    InteractiveWithStrategy(String),

    /// A reset was requested together with an explicit target version.
    #[error("--reset cannot be combined with a target version")]
    ResetWithVersion,

    /// No component ids were supplied (and `--all` was not set).
    #[error("no component ids given")]
    NoComponents,
}

// ---------------------------------------------------------------------------
// Merge errors
// ---------------------------------------------------------------------------

/// Errors from the three-way merge engine.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A file had no content on any of the three sides.
    #[error("file '{0}' is absent from base, local, and target")]
    EmptyTriple(String),
}

// ---------------------------------------------------------------------------
// Checkout errors
// ---------------------------------------------------------------------------

/// Per-component checkout failures.
///
/// These never abort the batch; the orchestrator turns each one into a
/// `FailedComponent` entry.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Underlying store failure (after retries are exhausted).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Merge engine failure.
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// The batch was cancelled before this component started.
    #[error("checkout cancelled before this component was processed")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// Prompt errors
// ---------------------------------------------------------------------------

/// Errors from the interactive resolution prompt collaborator.
#[derive(Debug, Error)]
pub enum PromptError {
    /// No interactive terminal is attached. Degrades to manual resolution.
    #[error("interactive prompt unavailable: {0}")]
    Unavailable(String),

    /// The prompt itself failed (terminal I/O).
    #[error("prompt I/O error: {0}")]
    Io(#[from] std::io::Error),
}
