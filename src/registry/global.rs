//! Process-wide registry
//!
//! Populated once by [`init`] during application startup and read-only after
//! that. [`reset`] exists for tests that need to rebuild it.

use crate::error::RegistryError;
use crate::registry::SpecRegistry;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

static GLOBAL_REGISTRY: RwLock<Option<Arc<SpecRegistry>>> = parking_lot::const_rwlock(None);

/// Install the process-wide registry. Fails if one is already installed.
pub fn init(registry: SpecRegistry) -> Result<Arc<SpecRegistry>, RegistryError> {
    let mut slot = GLOBAL_REGISTRY.write();
    if slot.is_some() {
        return Err(RegistryError::AlreadyInitialized);
    }
    let registry = Arc::new(registry);
    info!(generators = registry.len(), "Spec registry initialized");
    *slot = Some(Arc::clone(&registry));
    Ok(registry)
}

/// The installed registry, if [`init`] has run
pub fn global() -> Option<Arc<SpecRegistry>> {
    GLOBAL_REGISTRY.read().clone()
}

/// Test-only: drop the installed registry so a test can call [`init`] again.
#[doc(hidden)]
pub fn reset() {
    *GLOBAL_REGISTRY.write() = None;
}
