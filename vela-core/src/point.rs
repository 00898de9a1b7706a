use std::sync::Arc;

use crate::registry::ExtensionRegistry;

/// Names a single extension point: a Rust trait (`Iface`) that multiple
/// interchangeable implementations can satisfy, plus the metadata the
/// registry needs to load and dispatch them.
///
/// `Self` is a zero-sized marker type, not the interface itself — this keeps
/// the "what extension point is this" identity (a type, usable as a
/// `DashMap`/generic-static key) separate from "what trait do implementations
/// satisfy" (`Iface`, which may be `?Sized`). A typical extension point looks
/// like:
///
/// ```ignore
/// pub struct Protocol;
/// impl ExtensionPoint for Protocol {
///     type Iface = dyn ProtocolApi;
///     const TYPE_TAG: &'static str = "protocol";
///     const DEFAULT_NAME: Option<&'static str> = Some("vela");
///     fn adaptive(registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
///         Arc::new(AdaptiveProtocol::new(registry))
///     }
/// }
/// ```
pub trait ExtensionPoint: Sized + Send + Sync + 'static {
    /// The trait implementations of this extension point satisfy.
    type Iface: ?Sized + Send + Sync + 'static;

    /// Stable name for this extension point, used as the descriptor resource
    /// name and in error messages. Descriptor files live at
    /// `<root>/<TYPE_TAG>` under each search root.
    const TYPE_TAG: &'static str;

    /// The name to fall back to when a caller doesn't name one explicitly.
    /// `None` means the point has no sensible default.
    const DEFAULT_NAME: Option<&'static str> = None;

    /// Build the adaptive dispatcher singleton for this point.
    ///
    /// Because Rust has no runtime codegen, this is hand-authored per
    /// extension point rather than synthesized from descriptor metadata: a
    /// small wrapper struct that implements `Iface` by delegating each method
    /// through an [`crate::adaptive::AdaptiveDispatcher`]. Bootstrap-style
    /// points may return a fixed, non-dispatching implementation instead.
    fn adaptive(registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface>;
}

/// Exposes the method name of an in-flight call, for extension points whose
/// adaptive key plan includes method-scoped parameter lookups
/// (`<method>.<key>` before `<key>`).
pub trait Invocation {
    fn method_name(&self) -> &str;
}
