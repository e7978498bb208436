//! compvc core library.
//!
//! This crate provides the version-checkout and conflict-resolution engine
//! for component-based version control: component identity and invocation
//! configuration, the version store boundary, working-copy modification
//! detection, three-way merging, strategy-based conflict resolution, and
//! the batch checkout orchestrator.

pub mod checkout;
pub mod component;
pub mod errors;
pub mod merge;
pub mod snapshot;
pub mod status;
pub mod store;

// Re-exports for convenience.
pub use checkout::{ApplyVersionResults, CheckoutOrchestrator};
pub use component::{CheckoutOptions, ComponentId, MergeStrategy, TargetDirective, Version};
pub use snapshot::FileSnapshot;
pub use store::FsStore;
