//! End-to-end scenarios against the public registry API: bootstrap role
//! classification, adaptive dispatch, activation filtering, descriptor
//! loading idempotence, programmatic `add`/`replace`, and the concurrent
//! singleton-construction race.
//!
//! Each test defines its own marker `ExtensionPoint` type: the registry is a
//! process-wide singleton keyed by `TypeId`, so sharing a marker type across
//! tests in this binary would leak state between them.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::tempdir;

use vela_core::prelude::*;

/// A `ResourceLoader` that always returns one fixed descriptor file, for
/// tests that don't need real filesystem I/O.
struct StaticResourceLoader {
    lines: &'static str,
}

impl ResourceLoader for StaticResourceLoader {
    fn resources(&self, _type_tag: &str) -> Vec<(String, String)> {
        vec![("fixture".to_string(), self.lines.to_string())]
    }
}

// ── Scenario 1: bootstrap / wrapper vs ordinary classification ──────────

trait HelloApi: Send + Sync {
    fn greet(&self) -> String;
}

struct HelloA {
    inner: Arc<dyn HelloApi>,
}
impl HelloApi for HelloA {
    fn greet(&self) -> String {
        format!("a({})", self.inner.greet())
    }
}

struct HelloB;
impl HelloApi for HelloB {
    fn greet(&self) -> String {
        "b".to_string()
    }
}

struct Hello;
impl ExtensionPoint for Hello {
    type Iface = dyn HelloApi;
    const TYPE_TAG: &'static str = "hello";
    fn adaptive(_registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        unreachable!("this scenario never asks for the adaptive dispatcher")
    }
}

#[test]
fn bootstrap_wrapper_vs_ordinary_classification() {
    let registry = ExtensionRegistry::<Hello>::global();
    registry.register_wrapper("hello-a", |inner| Arc::new(HelloA { inner }) as Arc<dyn HelloApi>);
    registry.register_ordinary("hello-b", || HelloB, |c| c as Arc<dyn HelloApi>);
    registry.set_resource_loader(Arc::new(StaticResourceLoader { lines: "a=hello-a\nb=hello-b\n" }));

    let b = registry.get("b").expect("b resolves to hello-b wrapped by hello-a");
    assert_eq!(b.greet(), "a(b)");

    let err = registry.get("a").expect_err("hello-a is a wrapper, not an ordinary implementation");
    assert!(matches!(err, ExtensionError::NotFound { .. }));
}

// ── Scenario 2: adaptive dispatch by URL protocol ────────────────────────

trait ProtocolApi: Send + Sync {
    fn export(&self, url: &Url) -> String;
}

struct DubboProtocol;
impl ProtocolApi for DubboProtocol {
    fn export(&self, url: &Url) -> String {
        format!("dubbo-export:{}", url.address())
    }
}

struct AdaptiveProtocol(AdaptiveDispatcher<Protocol>);
impl ProtocolApi for AdaptiveProtocol {
    fn export(&self, url: &Url) -> String {
        self.0.resolve(url, None).expect("protocol key resolves from the url scheme").export(url)
    }
}

struct Protocol;
impl ExtensionPoint for Protocol {
    type Iface = dyn ProtocolApi;
    const TYPE_TAG: &'static str = "protocol";
    fn adaptive(registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        Arc::new(AdaptiveProtocol(AdaptiveDispatcher::new(registry, AdaptiveKeyPlan::protocol())))
    }
}

#[test]
fn adaptive_dispatch_routes_by_url_protocol() {
    let registry = ExtensionRegistry::<Protocol>::global();
    registry.register_ordinary("vela-dubbo-protocol", || DubboProtocol, |c| c as Arc<dyn ProtocolApi>);
    registry.set_resource_loader(Arc::new(StaticResourceLoader { lines: "dubbo=vela-dubbo-protocol\n" }));

    let url = Url::parse("dubbo://host:20880").unwrap();
    let result = registry.get_adaptive().unwrap().export(&url);
    assert_eq!(result, "dubbo-export:host:20880");
}

// ── Scenario 5: activation filter (group, keys, explicit removal) ───────

trait FilterApi: Send + Sync {
    fn name(&self) -> &'static str;
}

struct XFilter;
impl FilterApi for XFilter {
    fn name(&self) -> &'static str {
        "x"
    }
}

struct YFilter;
impl FilterApi for YFilter {
    fn name(&self) -> &'static str {
        "y"
    }
}

struct FilterPoint;
impl ExtensionPoint for FilterPoint {
    type Iface = dyn FilterApi;
    const TYPE_TAG: &'static str = "filter";
    fn adaptive(_registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        unreachable!("this scenario never asks for the adaptive dispatcher")
    }
}

#[test]
fn activation_filter_respects_group_keys_and_explicit_removal() {
    let registry = ExtensionRegistry::<FilterPoint>::global();
    let x_meta = ActivationMeta {
        group: Some(vec!["provider".into()]),
        keys: vec!["cache"],
        ..Default::default()
    };
    let y_meta = ActivationMeta {
        group: Some(vec!["consumer".into()]),
        ..Default::default()
    };
    registry.register_ordinary_activated("vela-x-filter", || XFilter, |c| c as Arc<dyn FilterApi>, Some(x_meta));
    registry.register_ordinary_activated("vela-y-filter", || YFilter, |c| c as Arc<dyn FilterApi>, Some(y_meta));
    registry.set_resource_loader(Arc::new(StaticResourceLoader { lines: "x=vela-x-filter\ny=vela-y-filter\n" }));

    let url = Url::parse("dubbo://host?cache=lru").unwrap();
    let names = vec!["-y".to_string()];

    let active = registry.get_activate(&url, &names, Some("provider")).unwrap();
    assert_eq!(active.iter().map(|f| f.name()).collect::<Vec<_>>(), vec!["x"]);

    let active_no_group = registry.get_activate(&url, &names, None).unwrap();
    assert_eq!(active_no_group.iter().map(|f| f.name()).collect::<Vec<_>>(), vec!["x"]);
}

// ── Invariant: descriptor loading runs exactly once per registry ────────

struct CountingLoader {
    calls: AtomicUsize,
    lines: &'static str,
}

impl ResourceLoader for CountingLoader {
    fn resources(&self, _type_tag: &str) -> Vec<(String, String)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        vec![("fixture".to_string(), self.lines.to_string())]
    }
}

trait EchoApi: Send + Sync {
    fn ping(&self) -> &'static str;
}
struct EchoImpl;
impl EchoApi for EchoImpl {
    fn ping(&self) -> &'static str {
        "pong"
    }
}

struct Echo;
impl ExtensionPoint for Echo {
    type Iface = dyn EchoApi;
    const TYPE_TAG: &'static str = "echo";
    fn adaptive(_registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        unreachable!("this scenario never asks for the adaptive dispatcher")
    }
}

#[test]
fn descriptor_loading_runs_exactly_once() {
    let registry = ExtensionRegistry::<Echo>::global();
    registry.register_ordinary("vela-echo-impl", || EchoImpl, |c| c as Arc<dyn EchoApi>);
    let loader = Arc::new(CountingLoader { calls: AtomicUsize::new(0), lines: "echo=vela-echo-impl\n" });
    registry.set_resource_loader(loader.clone());

    for _ in 0..5 {
        assert_eq!(registry.get("echo").unwrap().ping(), "pong");
        let _ = registry.supported_names();
        assert!(registry.has("echo"));
    }
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
}

// ── Filesystem resource loader, exercised against real descriptor files ──

trait FsApi: Send + Sync {
    fn val(&self) -> &'static str;
}
struct FsImpl;
impl FsApi for FsImpl {
    fn val(&self) -> &'static str {
        "fs"
    }
}

struct FsPoint;
impl ExtensionPoint for FsPoint {
    type Iface = dyn FsApi;
    const TYPE_TAG: &'static str = "fs-point";
    fn adaptive(_registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        unreachable!("this scenario never asks for the adaptive dispatcher")
    }
}

#[test]
fn filesystem_resource_loader_reads_descriptor_files() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("internal");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("fs-point"), "only=vela-fs-impl\n").unwrap();

    let registry = ExtensionRegistry::<FsPoint>::global();
    registry.register_ordinary("vela-fs-impl", || FsImpl, |c| c as Arc<dyn FsApi>);
    registry.set_resource_loader(Arc::new(FileSystemResourceLoader::with_roots(vec![root])));

    assert_eq!(registry.get("only").unwrap().val(), "fs");
}

// ── The special "true" name resolves to the configured default ──────────

trait DefApi: Send + Sync {
    fn tag(&self) -> &'static str;
}
struct DefImpl;
impl DefApi for DefImpl {
    fn tag(&self) -> &'static str {
        "default-impl"
    }
}

struct DefPoint;
impl ExtensionPoint for DefPoint {
    type Iface = dyn DefApi;
    const TYPE_TAG: &'static str = "def-point";
    const DEFAULT_NAME: Option<&'static str> = Some("def");
    fn adaptive(_registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        unreachable!("this scenario never asks for the adaptive dispatcher")
    }
}

#[test]
fn true_name_resolves_to_configured_default() {
    let registry = ExtensionRegistry::<DefPoint>::global();
    registry.register_ordinary("vela-def-impl", || DefImpl, |c| c as Arc<dyn DefApi>);
    registry.set_resource_loader(Arc::new(StaticResourceLoader { lines: "def=vela-def-impl\n" }));

    assert_eq!(registry.get("true").unwrap().tag(), "default-impl");
}

// ── Programmatic add/replace ─────────────────────────────────────────────

trait AddApi: Send + Sync {
    fn tag(&self) -> &'static str;
}
struct AddA;
impl AddApi for AddA {
    fn tag(&self) -> &'static str {
        "a"
    }
}
struct AddB;
impl AddApi for AddB {
    fn tag(&self) -> &'static str {
        "b"
    }
}

struct AddPoint;
impl ExtensionPoint for AddPoint {
    type Iface = dyn AddApi;
    const TYPE_TAG: &'static str = "add-point";
    fn adaptive(_registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        unreachable!("this scenario never asks for the adaptive dispatcher")
    }
}

#[test]
fn add_and_replace_manage_programmatic_names() {
    let registry = ExtensionRegistry::<AddPoint>::global();
    registry.register_ordinary("vela-add-a", || AddA, |c| c as Arc<dyn AddApi>);
    registry.register_ordinary("vela-add-b", || AddB, |c| c as Arc<dyn AddApi>);
    registry.set_resource_loader(Arc::new(StaticResourceLoader { lines: "" }));

    registry.add("extra", "vela-add-a").unwrap();
    assert_eq!(registry.get("extra").unwrap().tag(), "a");

    let dup_err = registry.add("extra", "vela-add-b").expect_err("extra is already mapped to vela-add-a");
    assert!(matches!(dup_err, ExtensionError::DuplicateName { .. }));

    registry.replace("extra", "vela-add-b").unwrap();
    assert_eq!(registry.get("extra").unwrap().tag(), "b");

    let missing_err = registry.replace("never-added", "vela-add-a").expect_err("never-added was never registered");
    assert!(matches!(missing_err, ExtensionError::NotFound { .. }));

    assert!(registry.supported_names().contains(&"extra".to_string()));
}

// ── Invariant: concurrent get(name) observes the same singleton ─────────

trait RaceApi: Send + Sync {}
struct RaceImpl;
impl RaceApi for RaceImpl {}

struct RacePoint;
impl ExtensionPoint for RacePoint {
    type Iface = dyn RaceApi;
    const TYPE_TAG: &'static str = "race-point";
    fn adaptive(_registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        unreachable!("this scenario never asks for the adaptive dispatcher")
    }
}

#[test]
fn concurrent_get_returns_the_same_instance() {
    let registry = ExtensionRegistry::<RacePoint>::global();
    registry.register_ordinary("vela-race-impl", || RaceImpl, |c| c as Arc<dyn RaceApi>);
    registry.set_resource_loader(Arc::new(StaticResourceLoader { lines: "race=vela-race-impl\n" }));

    let barrier = Arc::new(Barrier::new(16));
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                ExtensionRegistry::<RacePoint>::global().get("race").unwrap()
            })
        })
        .collect();

    let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for pair in instances.windows(2) {
        assert!(Arc::ptr_eq(&pair[0], &pair[1]));
    }
}

// ── Scenario: adaptive dispatcher rejects a non-adaptive method ─────────

trait RouterApi: Send + Sync {
    fn route(&self, url: &Url) -> Result<String, ExtensionError>;
    fn describe(&self) -> Result<&'static str, ExtensionError>;
}

struct VelaRouter;
impl RouterApi for VelaRouter {
    fn route(&self, url: &Url) -> Result<String, ExtensionError> {
        Ok(format!("routed:{}", url.address()))
    }
    fn describe(&self) -> Result<&'static str, ExtensionError> {
        Ok("vela-router")
    }
}

/// Only `route` is adaptive (dispatched by URL protocol); `describe` has no
/// key to dispatch on and raises `UnsupportedOperation` instead of guessing
/// an implementation.
struct AdaptiveRouter(AdaptiveDispatcher<Router>);
impl RouterApi for AdaptiveRouter {
    fn route(&self, url: &Url) -> Result<String, ExtensionError> {
        self.0.resolve(url, None)?.route(url)
    }
    fn describe(&self) -> Result<&'static str, ExtensionError> {
        Err(ExtensionError::UnsupportedOperation { point: Router::TYPE_TAG, method: "describe" })
    }
}

struct Router;
impl ExtensionPoint for Router {
    type Iface = dyn RouterApi;
    const TYPE_TAG: &'static str = "router";
    fn adaptive(registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        Arc::new(AdaptiveRouter(AdaptiveDispatcher::new(registry, AdaptiveKeyPlan::protocol())))
    }
}

#[test]
fn adaptive_dispatcher_raises_unsupported_operation_for_non_adaptive_method() {
    let registry = ExtensionRegistry::<Router>::global();
    registry.register_ordinary("vela-router", || VelaRouter, |c| c as Arc<dyn RouterApi>);
    registry.set_resource_loader(Arc::new(StaticResourceLoader { lines: "vela=vela-router\n" }));

    let dispatcher = registry.get_adaptive().unwrap();

    let url = Url::parse("vela://host:1234").unwrap();
    assert_eq!(dispatcher.route(&url).unwrap(), "routed:host:1234");

    let err = dispatcher.describe().expect_err("describe has no adaptive key and must be rejected");
    match err {
        ExtensionError::UnsupportedOperation { point, method } => {
            assert_eq!(point, "router");
            assert_eq!(method, "describe");
        }
        other => panic!("expected UnsupportedOperation, got {other:?}"),
    }
}

// ── Scenario: two wrappers compose around one ordinary implementation ───

trait GreetApi: Send + Sync {
    fn greet(&self) -> String;
}

struct LoudWrapper {
    inner: Arc<dyn GreetApi>,
}
impl GreetApi for LoudWrapper {
    fn greet(&self) -> String {
        format!("loud({})", self.inner.greet())
    }
}

struct PoliteWrapper {
    inner: Arc<dyn GreetApi>,
}
impl GreetApi for PoliteWrapper {
    fn greet(&self) -> String {
        format!("polite({})", self.inner.greet())
    }
}

struct PlainGreeter;
impl GreetApi for PlainGreeter {
    fn greet(&self) -> String {
        "hi".to_string()
    }
}

struct GreetPoint;
impl ExtensionPoint for GreetPoint {
    type Iface = dyn GreetApi;
    const TYPE_TAG: &'static str = "greet-point";
    fn adaptive(_registry: &'static ExtensionRegistry<Self>) -> Arc<Self::Iface> {
        unreachable!("this scenario never asks for the adaptive dispatcher")
    }
}

#[test]
fn two_wrappers_each_apply_exactly_once_with_ordinary_innermost() {
    let registry = ExtensionRegistry::<GreetPoint>::global();
    registry.register_wrapper("polite-wrapper", |inner| Arc::new(PoliteWrapper { inner }) as Arc<dyn GreetApi>);
    registry.register_wrapper("loud-wrapper", |inner| Arc::new(LoudWrapper { inner }) as Arc<dyn GreetApi>);
    registry.register_ordinary("plain-greeter", || PlainGreeter, |c| c as Arc<dyn GreetApi>);
    registry.set_resource_loader(Arc::new(StaticResourceLoader {
        lines: "polite=polite-wrapper\nloud=loud-wrapper\nplain=plain-greeter\n",
    }));

    let greeter = registry.get("plain").expect("plain resolves to plain-greeter wrapped by both wrappers");
    assert_eq!(greeter.greet(), "loud(polite(hi))");
}
