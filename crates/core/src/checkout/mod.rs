//! Batch checkout: orchestration, result contract, post-checkout hooks.

pub mod hooks;
pub mod orchestrator;
pub mod results;

pub use hooks::{DependencyInstaller, DistWriter, NoopHooks};
pub use orchestrator::CheckoutOrchestrator;
pub use results::{
    ApplyVersionResults, CheckoutStatus, ComponentCheckoutResult, FailedComponent, FileOutcome,
};
