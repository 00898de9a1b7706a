//! Dependency injection for implementations built by a registry.
//!
//! A runtime-reflection-based extension factory would need to look
//! dependency instances up by a type token at runtime with no compile-time
//! help. Rust generics give us that lookup for free:
//! `inject::<SomeExtensionPoint>()` reaches the right registry directly, so
//! there is no separate pluggable factory type to model. Implementations
//! that want a dependency call this from inside their `build` closure at
//! registration time (constructor injection).
use std::sync::Arc;

use crate::point::ExtensionPoint;
use crate::registry::ExtensionRegistry;

/// Resolve the adaptive extension for `D`, to be wired into a dependent
/// implementation's fields at construction time.
///
/// Injection failures are logged, not propagated: a missing or
/// unsynthesizable dependency must not prevent the dependent instance itself
/// from being constructed.
pub fn inject<D: ExtensionPoint>() -> Option<Arc<D::Iface>> {
    match ExtensionRegistry::<D>::global().get_adaptive() {
        Ok(ext) => Some(ext),
        Err(err) => {
            tracing::warn!(point = D::TYPE_TAG, error = %err, "dependency injection failed");
            None
        }
    }
}
