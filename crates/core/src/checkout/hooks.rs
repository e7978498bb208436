//! Post-checkout side-effect collaborators.
//!
//! After a successful checkout the orchestrator asks the dependency
//! installer and dist writer to run, unless the invocation's skip options
//! say otherwise. The engine only decides *whether* to request these side
//! effects; how they work is the collaborator's business, and a hook
//! failure is logged but never fails the component.

use crate::component::ComponentId;

/// Installs a component's packages after checkout.
pub trait DependencyInstaller: Send + Sync {
    fn install(&self, id: &ComponentId) -> anyhow::Result<()>;
}

/// Regenerates a component's dist artifacts after checkout.
pub trait DistWriter: Send + Sync {
    fn write_dist(&self, id: &ComponentId) -> anyhow::Result<()>;
}

/// Default collaborator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl DependencyInstaller for NoopHooks {
    fn install(&self, _id: &ComponentId) -> anyhow::Result<()> {
        Ok(())
    }
}

impl DistWriter for NoopHooks {
    fn write_dist(&self, _id: &ComponentId) -> anyhow::Result<()> {
        Ok(())
    }
}
