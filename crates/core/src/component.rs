//! Component identity and checkout-invocation configuration.
//!
//! The historically flag-driven configuration (`--interactive-merge`,
//! `--ours`, `--theirs`, `--manual`, `--reset`) is normalized at the
//! boundary into two orthogonal immutable values: a [`TargetDirective`]
//! and a [`MergeStrategy`]. Mutual exclusivity is validated here, before
//! the engine runs, so the merge logic never has to re-check flags.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// An opaque version label (e.g. `0.0.2`).
///
/// The engine never parses versions; ordering is the store's concern
/// (`resolve_latest` returns the newest label for a component).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub String);

impl Version {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// ComponentId
// ---------------------------------------------------------------------------

/// Identity of a component: scope + name, optionally pinned to a version.
///
/// A missing version means "the working copy". Equality is on the full
/// scope/name/version triple.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentId {
    pub scope: String,
    pub name: String,
    pub version: Option<Version>,
}

impl ComponentId {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
            version: None,
        }
    }

    /// The same id pinned to a concrete version.
    pub fn with_version(&self, version: Version) -> Self {
        Self {
            scope: self.scope.clone(),
            name: self.name.clone(),
            version: Some(version),
        }
    }

    /// `scope/name` without the version suffix.
    pub fn to_string_without_version(&self) -> String {
        format!("{}/{}", self.scope, self.name)
    }

    /// Parse `scope/name` or `scope/name@version`.
    pub fn parse(s: &str) -> Option<Self> {
        let (path, version) = match s.split_once('@') {
            Some((p, v)) if !v.is_empty() => (p, Some(Version::new(v))),
            Some(_) => return None,
            None => (s, None),
        };
        let (scope, name) = path.split_once('/')?;
        if scope.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            scope: scope.to_string(),
            name: name.to_string(),
            version,
        })
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}/{}@{}", self.scope, self.name, v),
            None => write!(f, "{}/{}", self.scope, self.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Target directive
// ---------------------------------------------------------------------------

/// The requested destination state for a checkout.
///
/// Exactly one directive is active per invocation; the variants are
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDirective {
    /// Check out a specific version.
    Explicit(Version),
    /// Check out each component's latest known version. Different
    /// components in one batch may resolve to different versions.
    Latest,
    /// Discard local modifications and restore the base snapshot.
    Reset,
}

impl std::fmt::Display for TargetDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit(v) => write!(f, "{}", v),
            Self::Latest => write!(f, "latest"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

// ---------------------------------------------------------------------------
// Merge strategy
// ---------------------------------------------------------------------------

/// Conflict-resolution policy, derived once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// On conflict, keep the local modification.
    Ours,
    /// On conflict, take the target version.
    Theirs,
    /// Leave conflict markers in place for out-of-band resolution.
    Manual,
    /// Ask an external prompt per conflicted file.
    ManualInteractive,
    /// No strategy flag given; conflicted files keep their markers.
    Unspecified,
}

impl MergeStrategy {
    /// Normalize the raw CLI flags into a strategy.
    ///
    /// At most one of `ours` / `theirs` / `manual` may be set, and the
    /// interactive flag cannot be combined with any of them.
    pub fn from_flags(
        interactive: bool,
        ours: bool,
        theirs: bool,
        manual: bool,
    ) -> Result<Self, ConfigError> {
        let set: Vec<&str> = [("ours", ours), ("theirs", theirs), ("manual", manual)]
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| *name)
            .collect();

        if set.len() > 1 {
            return Err(ConfigError::ConflictingStrategies(set.join(", ")));
        }
        if interactive {
            if let Some(flag) = set.first() {
                return Err(ConfigError::InteractiveWithStrategy(flag.to_string()));
            }
            return Ok(Self::ManualInteractive);
        }

        Ok(match set.first() {
            Some(&"ours") => Self::Ours,
            Some(&"theirs") => Self::Theirs,
            Some(&"manual") => Self::Manual,
            _ => Self::Unspecified,
        })
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ours => write!(f, "ours"),
            Self::Theirs => write!(f, "theirs"),
            Self::Manual => write!(f, "manual"),
            Self::ManualInteractive => write!(f, "manual-interactive"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}

// ---------------------------------------------------------------------------
// Checkout options
// ---------------------------------------------------------------------------

/// Per-invocation boolean options that do not affect merge semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckoutOptions {
    /// Include per-file outcome detail in reports.
    pub verbose: bool,
    /// Skip the dependency-installer hook after a successful checkout.
    pub skip_dependency_install: bool,
    /// Skip the dist-writer hook after a successful checkout.
    pub skip_dist_write: bool,
}
