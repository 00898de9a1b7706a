//! Import everything you need to define and consume an extension point with
//! a single `use vela_core::prelude::*;`.

// ── Extension point definition ──────────────────────────────────────────

pub use crate::point::{ExtensionPoint, Invocation};
pub use crate::registry::{ExtensionRegistry, Role};

// ── Adaptive dispatch ────────────────────────────────────────────────────

pub use crate::adaptive::{AdaptiveDispatcher, AdaptiveKey, AdaptiveKeyPlan};

// ── Activation filtering ─────────────────────────────────────────────────

pub use crate::activation::ActivationMeta;

// ── Loading & injection ──────────────────────────────────────────────────

pub use crate::injection::inject;
pub use crate::loader::{FileSystemResourceLoader, ResourceLoader};

// ── Supporting types ─────────────────────────────────────────────────────

pub use crate::error::ExtensionError;
pub use crate::url::Url;
