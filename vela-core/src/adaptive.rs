//! The adaptive key-walk plan and the small dispatcher helper extension
//! points use to build a dispatching implementation around it.
//!
//! There is no runtime codegen here: the key-walk algorithm (steps 3-5, name
//! resolution and registry lookup) is generic over any extension point and
//! lives in [`AdaptiveKeyPlan::resolve`]/[`AdaptiveDispatcher`]. Extracting a
//! `Url` (and, where relevant, an [`crate::point::Invocation`]) out of a
//! specific method's arguments is necessarily per-method — Rust method
//! signatures are static, there is nothing to reflect over — so that part is
//! a few lines of hand-written glue per adaptive method, not a separate
//! abstraction.

use std::sync::Arc;

use crate::error::ExtensionError;
use crate::point::ExtensionPoint;
use crate::registry::ExtensionRegistry;
use crate::url::Url;

/// One step of the key-walk: either "use the URL's protocol scheme
/// directly" or "look up this named parameter".
#[derive(Debug, Clone, Copy)]
pub enum AdaptiveKey {
    Protocol,
    Named(&'static str),
}

/// The ordered list of keys an adaptive method tries, left to right, before
/// falling back to the extension point's declared default name.
#[derive(Debug, Clone)]
pub struct AdaptiveKeyPlan {
    keys: Vec<AdaptiveKey>,
}

impl AdaptiveKeyPlan {
    pub fn new(keys: Vec<AdaptiveKey>) -> Self {
        Self { keys }
    }

    /// A plan that always dispatches on the URL's own protocol scheme — the
    /// common case for an extension point like `Protocol` itself.
    pub fn protocol() -> Self {
        Self { keys: vec![AdaptiveKey::Protocol] }
    }

    /// A plan that looks up a single named URL parameter.
    pub fn named(key: &'static str) -> Self {
        Self { keys: vec![AdaptiveKey::Named(key)] }
    }

    /// Walk the plan's keys against `url` (and `invocation_method`, if the
    /// call site has one), returning the first non-empty value found. Falls
    /// back to `default_name` if no key produces one.
    pub fn resolve(&self, url: &Url, invocation_method: Option<&str>, default_name: Option<&str>) -> Option<String> {
        for key in &self.keys {
            let value = match key {
                AdaptiveKey::Protocol => {
                    let p = url.protocol();
                    if p.is_empty() { None } else { Some(p.to_string()) }
                }
                AdaptiveKey::Named(k) => match invocation_method {
                    Some(m) => url.method_parameter(m, k, None),
                    None => url.parameter(k, None),
                },
            };
            if value.is_some() {
                return value;
            }
        }
        default_name.map(str::to_string)
    }
}

/// Glue between an [`AdaptiveKeyPlan`] and a registry: resolves a name from
/// a `Url` and hands back the fully composed implementation.
///
/// An extension point's adaptive wrapper struct holds one of these and calls
/// [`Self::resolve`] from each trait method, e.g.:
///
/// ```ignore
/// struct AdaptiveProtocol(AdaptiveDispatcher<Protocol>);
/// impl ProtocolApi for AdaptiveProtocol {
///     fn export(&self, invoker: Arc<dyn Invoker>) -> Result<Exporter, ExtensionError> {
///         let url = invoker.url();
///         self.0.resolve(url, None)?.export(invoker)
///     }
/// }
/// ```
pub struct AdaptiveDispatcher<P: ExtensionPoint> {
    registry: &'static ExtensionRegistry<P>,
    plan: AdaptiveKeyPlan,
}

impl<P: ExtensionPoint> AdaptiveDispatcher<P> {
    pub fn new(registry: &'static ExtensionRegistry<P>, plan: AdaptiveKeyPlan) -> Self {
        Self { registry, plan }
    }

    pub fn resolve(&self, url: &Url, invocation_method: Option<&str>) -> Result<Arc<P::Iface>, ExtensionError> {
        let default_name = self.registry.default_name().map(str::to_string);
        let name = self
            .plan
            .resolve(url, invocation_method, default_name.as_deref())
            .ok_or_else(|| ExtensionError::SynthesisFailure {
                point: P::TYPE_TAG,
                reason: "no key in the adaptive plan produced a usable extension name and no default exists".to_string(),
            })?;
        self.registry.get(&name)
    }
}
