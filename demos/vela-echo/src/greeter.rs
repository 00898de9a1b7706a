//! A toy `Greeter` extension point wiring together every piece this demo
//! exists to prove out: an ordinary implementation, a decorating wrapper,
//! and URL-driven adaptive dispatch, all served over the exchange codec.

use std::sync::Arc;

use vela::prelude::*;

pub trait Greeter: Send + Sync + 'static {
    fn greet(&self, name: &str) -> String;
}

pub struct GreeterPoint;

impl ExtensionPoint for GreeterPoint {
    type Iface = dyn Greeter;
    const TYPE_TAG: &'static str = "greeter";
    const DEFAULT_NAME: Option<&'static str> = Some("plain");

    fn adaptive(registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        Arc::new(AdaptiveGreeter(AdaptiveDispatcher::new(registry, AdaptiveKeyPlan::named("greeter"))))
    }
}

/// Says hello, plainly.
struct PlainGreeter;

impl Greeter for PlainGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {name}!")
    }
}

/// Says hello with rather more enthusiasm.
struct EnthusiasticGreeter;

impl Greeter for EnthusiasticGreeter {
    fn greet(&self, name: &str) -> String {
        format!("HELLO, {}!!!", name.to_uppercase())
    }
}

/// Decorates another `Greeter`, logging each call before returning its result.
struct LoggingGreeter(Arc<dyn Greeter>);

impl Greeter for LoggingGreeter {
    fn greet(&self, name: &str) -> String {
        let response = self.0.greet(name);
        tracing::info!(name, response = %response, "greeter invoked");
        response
    }
}

/// Delegates to whichever greeter a call's URL names, falling back to the
/// extension point's default. Used as the extension point's bootstrap
/// `adaptive()` implementation against a nominal URL; callers that have a
/// real per-call URL should build their own [`AdaptiveDispatcher`] (see
/// [`dispatcher`]) instead of going through this fixed one.
struct AdaptiveGreeter(AdaptiveDispatcher<GreeterPoint>);

impl Greeter for AdaptiveGreeter {
    fn greet(&self, name: &str) -> String {
        match self.0.resolve(&Url::new("vela", "demo"), None) {
            Ok(g) => g.greet(name),
            Err(e) => format!("greeter unavailable: {e}"),
        }
    }
}

/// Build a dispatcher that resolves a greeter per-call from a caller-supplied
/// URL, keyed on the URL's `greeter` parameter.
pub fn dispatcher() -> AdaptiveDispatcher<GreeterPoint> {
    AdaptiveDispatcher::new(ExtensionRegistry::<GreeterPoint>::global(), AdaptiveKeyPlan::named("greeter"))
}

/// Hands the registry its descriptor content from a fixed string instead of
/// reading `META-VELA/...` files off disk — this demo has nothing to put
/// there, and a literal is easier to read than a fixture directory for a
/// handful of lines.
struct StaticDescriptor;

impl ResourceLoader for StaticDescriptor {
    fn resources(&self, type_tag: &str) -> Vec<(String, String)> {
        if type_tag != GreeterPoint::TYPE_TAG {
            return Vec::new();
        }
        vec![(
            "demo:greeter".to_string(),
            "plain=vela-echo-plain-greeter\n\
             loud=vela-echo-enthusiastic-greeter\n\
             vela-echo-logging-greeter\n"
                .to_string(),
        )]
    }
}

/// Register this demo's implementations and descriptor content. Idempotent:
/// safe to call more than once within a process.
pub fn bootstrap() {
    let registry = ExtensionRegistry::<GreeterPoint>::global();
    registry.set_resource_loader(Arc::new(StaticDescriptor));
    registry.register_ordinary("vela-echo-plain-greeter", || PlainGreeter, |c| c as Arc<dyn Greeter>);
    registry.register_ordinary("vela-echo-enthusiastic-greeter", || EnthusiasticGreeter, |c| c as Arc<dyn Greeter>);
    registry.register_wrapper("vela-echo-logging-greeter", |inner| Arc::new(LoggingGreeter(inner)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_loud_greeters_resolve_by_name_through_the_logging_wrapper() {
        bootstrap();
        let registry = ExtensionRegistry::<GreeterPoint>::global();
        assert_eq!(registry.get("plain").unwrap().greet("Ada"), "Hello, Ada!");
        assert_eq!(registry.get("loud").unwrap().greet("Ada"), "HELLO, ADA!!!");
    }

    #[test]
    fn adaptive_dispatch_falls_back_to_the_default_name() {
        bootstrap();
        let greeter = GreeterPoint::adaptive(ExtensionRegistry::<GreeterPoint>::global());
        assert_eq!(greeter.greet("Grace"), "Hello, Grace!");
    }
}
