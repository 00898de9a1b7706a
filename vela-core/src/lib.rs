//! Descriptor-driven extension resolution: a small service-provider registry
//! with activation filtering, decorator composition, and adaptive
//! (URL-driven) dispatch, built without runtime reflection or codegen.
//!
//! Start at [`point::ExtensionPoint`] to define a new extension point, and
//! [`registry::ExtensionRegistry`] for how implementations get registered,
//! loaded, and composed.

pub mod activation;
pub mod adaptive;
pub mod error;
pub mod global;
pub mod injection;
pub mod loader;
pub mod point;
pub mod prelude;
pub mod registry;
pub mod url;

pub use error::ExtensionError;
pub use point::{ExtensionPoint, Invocation};
pub use registry::{ExtensionRegistry, Role};
pub use url::Url;
