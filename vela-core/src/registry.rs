//! The per-extension-point registry: class registration, descriptor
//! loading, composition (bare instance → wrappers), and activation lookup.

use std::any::Any;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};

use dashmap::DashMap;

use crate::activation::{order_candidates, ActivationMeta};
use crate::error::ExtensionError;
use crate::global;
use crate::loader::{self, LoadTarget, ResourceLoader};
use crate::point::ExtensionPoint;
use crate::url::Url;

type AnyInstance = Arc<dyn Any + Send + Sync>;

/// How a registered class token is meant to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Ordinary,
    Wrapper,
    Adaptive,
}

pub(crate) enum ClassFactory<P: ExtensionPoint> {
    Ordinary {
        build: Arc<dyn Fn() -> AnyInstance + Send + Sync>,
        view: Arc<dyn Fn(AnyInstance) -> Option<Arc<P::Iface>> + Send + Sync>,
    },
    Wrapper {
        build: Arc<dyn Fn(Arc<P::Iface>) -> Arc<P::Iface> + Send + Sync>,
    },
    Adaptive {
        build: Arc<dyn Fn() -> Arc<P::Iface> + Send + Sync>,
    },
}

pub(crate) struct ClassEntry<P: ExtensionPoint> {
    pub role: Role,
    pub factory: ClassFactory<P>,
    pub activation: Option<ActivationMeta>,
}

/// Registry of implementations for a single extension point `P`.
///
/// One instance exists per extension point for the lifetime of the process,
/// reached through [`ExtensionRegistry::global`]. Registration
/// (`register_*`) is normally done once at startup, before anything calls
/// `get`/`get_adaptive`/`get_activate`, but is safe to interleave with
/// lookups: loading and composition are lazy and idempotent. `add`/`replace`
/// remain usable after descriptor loading has already run.
pub struct ExtensionRegistry<P: ExtensionPoint> {
    pub(crate) classes: DashMap<&'static str, ClassEntry<P>>,
    name_to_token: DashMap<String, String>,
    wrapper_tokens: Mutex<Vec<String>>,
    adaptive_token: OnceLock<String>,
    activation_by_name: DashMap<String, ActivationMeta>,
    load_errors: Mutex<Vec<String>>,
    descriptors_loaded: OnceLock<()>,
    composed: DashMap<String, Arc<OnceLock<Result<Arc<P::Iface>, ExtensionError>>>>,
    adaptive: OnceLock<Arc<P::Iface>>,
    resource_loader: OnceLock<Arc<dyn ResourceLoader>>,
}

impl<P: ExtensionPoint> Default for ExtensionRegistry<P> {
    fn default() -> Self {
        Self {
            classes: DashMap::new(),
            name_to_token: DashMap::new(),
            wrapper_tokens: Mutex::new(Vec::new()),
            adaptive_token: OnceLock::new(),
            activation_by_name: DashMap::new(),
            load_errors: Mutex::new(Vec::new()),
            descriptors_loaded: OnceLock::new(),
            composed: DashMap::new(),
            adaptive: OnceLock::new(),
            resource_loader: OnceLock::new(),
        }
    }
}

impl<P: ExtensionPoint> ExtensionRegistry<P> {
    /// The process-wide registry for extension point `P`.
    pub fn global() -> &'static ExtensionRegistry<P> {
        // `static` items can't reference a generic parameter of their
        // enclosing function, so "one instance per P" is keyed by `TypeId`
        // in a single process-wide map instead. Each distinct `P` is leaked
        // exactly once (on its first call here) and lives for the rest of
        // the process, same lifetime a literal generic static would have
        // given it.
        use std::any::TypeId;
        static REGISTRIES: OnceLock<DashMap<TypeId, &'static (dyn Any + Send + Sync)>> = OnceLock::new();
        let map = REGISTRIES.get_or_init(DashMap::new);
        let any_ref: &'static (dyn Any + Send + Sync) = {
            let guard = map.entry(TypeId::of::<P>()).or_insert_with(|| {
                let boxed: Box<ExtensionRegistry<P>> = Box::new(ExtensionRegistry::default());
                Box::leak(boxed) as &'static (dyn Any + Send + Sync)
            });
            *guard.value()
        };
        any_ref
            .downcast_ref::<ExtensionRegistry<P>>()
            .expect("type id mismatch in extension registry map")
    }

    /// Override the descriptor resource loader before first use. A no-op
    /// once the registry has already loaded descriptors.
    pub fn set_resource_loader(&self, loader: Arc<dyn ResourceLoader>) {
        let _ = self.resource_loader.set(loader);
    }

    fn resource_loader(&self) -> Arc<dyn ResourceLoader> {
        self.resource_loader
            .get_or_init(|| Arc::new(loader::FileSystemResourceLoader::default()))
            .clone()
    }

    /// Register a bare (undecorated) implementation. `build` constructs the
    /// concrete type; `view` narrows the erased `Arc<dyn Any>` back to
    /// `Arc<P::Iface>` via an unsized coercion at its return position (write
    /// it as `|c| c` when `C` already implements `Iface`, or `|c: Arc<C>| c
    /// as Arc<P::Iface>` to be explicit).
    ///
    /// The constructed instance is cached process-wide by `token`
    /// ([`crate::global`]) so the same class backing two different
    /// extension points is only ever built once.
    pub fn register_ordinary<C: Send + Sync + 'static>(
        &self,
        token: &'static str,
        build: impl Fn() -> C + Send + Sync + 'static,
        view: impl Fn(Arc<C>) -> Arc<P::Iface> + Send + Sync + 'static,
    ) {
        self.register_ordinary_activated(token, build, view, None)
    }

    /// Like [`Self::register_ordinary`], additionally declaring activation
    /// metadata used by [`Self::get_activate`].
    pub fn register_ordinary_activated<C: Send + Sync + 'static>(
        &self,
        token: &'static str,
        build: impl Fn() -> C + Send + Sync + 'static,
        view: impl Fn(Arc<C>) -> Arc<P::Iface> + Send + Sync + 'static,
        activation: Option<ActivationMeta>,
    ) {
        let any_build: Arc<dyn Fn() -> AnyInstance + Send + Sync> =
            Arc::new(move || Arc::new(build()) as AnyInstance);
        let any_view: Arc<dyn Fn(AnyInstance) -> Option<Arc<P::Iface>> + Send + Sync> =
            Arc::new(move |any| any.downcast::<C>().ok().map(&view));
        self.classes.insert(
            token,
            ClassEntry {
                role: Role::Ordinary,
                factory: ClassFactory::Ordinary { build: any_build, view: any_view },
                activation,
            },
        );
    }

    /// Register a decorator: given the already-composed inner instance,
    /// produce a wrapping instance that still implements `Iface`.
    pub fn register_wrapper(
        &self,
        token: &'static str,
        build: impl Fn(Arc<P::Iface>) -> Arc<P::Iface> + Send + Sync + 'static,
    ) {
        self.classes.insert(
            token,
            ClassEntry {
                role: Role::Wrapper,
                factory: ClassFactory::Wrapper { build: Arc::new(build) },
                activation: None,
            },
        );
    }

    /// Register a hand-written adaptive dispatcher. Most extension points
    /// should instead implement [`ExtensionPoint::adaptive`] and rely on
    /// [`crate::adaptive::AdaptiveDispatcher`]; this exists for bootstrap
    /// points with no data-driven key plan.
    pub fn register_adaptive(
        &self,
        token: &'static str,
        build: impl Fn() -> Arc<P::Iface> + Send + Sync + 'static,
    ) {
        self.classes.insert(
            token,
            ClassEntry {
                role: Role::Adaptive,
                factory: ClassFactory::Adaptive { build: Arc::new(build) },
                activation: None,
            },
        );
    }

    fn ensure_loaded(&self) {
        self.descriptors_loaded.get_or_init(|| {
            let target = LoadTarget {
                name_to_token: &self.name_to_token,
                wrapper_tokens: &self.wrapper_tokens,
                adaptive_token: &self.adaptive_token,
                activation_by_name: &self.activation_by_name,
                errors: &self.load_errors,
            };
            if let Err(e) = loader::load::<P>(&self.classes, self.resource_loader().as_ref(), &target) {
                panic!("fatal descriptor conflict for extension point '{}': {e}", P::TYPE_TAG);
            }
        });
    }

    /// `P::DEFAULT_NAME`, unless nothing is registered under that name (in
    /// which case there is nothing to fall back to).
    pub fn default_name(&self) -> Option<&'static str> {
        self.ensure_loaded();
        P::DEFAULT_NAME.filter(|n| self.name_to_token.contains_key(*n))
    }

    /// Programmatically map `name` to `token`. Fails if `name` is already
    /// mapped to a *different* token; re-adding the same mapping is a no-op.
    pub fn add(&self, name: &str, token: &str) -> Result<(), ExtensionError> {
        self.ensure_loaded();
        match self.name_to_token.get(name) {
            Some(existing) if existing.value() != token => Err(ExtensionError::DuplicateName {
                point: P::TYPE_TAG,
                name: name.to_string(),
                first: existing.value().clone(),
                second: token.to_string(),
            }),
            _ => {
                self.name_to_token.insert(name.to_string(), token.to_string());
                Ok(())
            }
        }
    }

    /// Programmatically repoint an existing `name` to a different `token`.
    /// Fails if `name` is not currently mapped. Drops the cached composed
    /// instance for `name` so the next `get` recomposes against the new
    /// token.
    pub fn replace(&self, name: &str, token: &str) -> Result<(), ExtensionError> {
        self.ensure_loaded();
        if !self.name_to_token.contains_key(name) {
            return Err(ExtensionError::NotFound {
                point: P::TYPE_TAG,
                name: name.to_string(),
                causes: vec!["cannot replace a name that was never registered".to_string()],
            });
        }
        self.name_to_token.insert(name.to_string(), token.to_string());
        self.composed.remove(name);
        Ok(())
    }

    /// Resolve and fully compose the named implementation: bare instance,
    /// then every registered wrapper in registration order. The special name
    /// `"true"` resolves to the extension point's default name.
    pub fn get(&self, name: &str) -> Result<Arc<P::Iface>, ExtensionError> {
        if name == "true" {
            let default = self.default_name().ok_or_else(|| ExtensionError::NotFound {
                point: P::TYPE_TAG,
                name: name.to_string(),
                causes: vec!["no default extension is configured for this point".to_string()],
            })?;
            return self.get(default);
        }

        self.ensure_loaded();
        let token = self.name_to_token.get(name).map(|r| r.value().clone()).ok_or_else(|| {
            let mut causes: Vec<String> = self
                .load_errors
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.to_lowercase().contains(&name.to_lowercase()))
                .cloned()
                .collect();
            if self.name_to_token.is_empty() {
                causes.push("no descriptor entries were loaded for this point".to_string());
            }
            ExtensionError::NotFound { point: P::TYPE_TAG, name: name.to_string(), causes }
        })?;

        let cell = self
            .composed
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .clone();

        cell.get_or_init(|| self.compose(&token)).clone()
    }

    fn compose(&self, token: &str) -> Result<Arc<P::Iface>, ExtensionError> {
        let entry = self.classes.get(token).ok_or_else(|| ExtensionError::NotFound {
            point: P::TYPE_TAG,
            name: token.to_string(),
            causes: vec![format!("class token '{token}' is not registered")],
        })?;
        let (build, view) = match &entry.factory {
            ClassFactory::Ordinary { build, view } => (build.clone(), view.clone()),
            _ => {
                return Err(ExtensionError::NotFound {
                    point: P::TYPE_TAG,
                    name: token.to_string(),
                    causes: vec![format!("class token '{token}' is not an ordinary implementation")],
                })
            }
        };
        drop(entry);

        let bare_any = global::get_or_build_bare(token, move || build());
        let mut current = view(bare_any).ok_or_else(|| ExtensionError::IllegalState(format!(
            "class token '{token}' built an instance that does not downcast to its registered type"
        )))?;

        let wrapper_tokens = self.wrapper_tokens.lock().unwrap().clone();
        for wrapper_token in &wrapper_tokens {
            if let Some(wrapper_entry) = self.classes.get(wrapper_token.as_str()) {
                if let ClassFactory::Wrapper { build } = &wrapper_entry.factory {
                    current = build(current);
                }
            }
        }
        Ok(current)
    }

    /// Resolve (and cache) the adaptive dispatcher singleton, building it via
    /// [`ExtensionPoint::adaptive`] on first use.
    pub fn get_adaptive(&self) -> Result<Arc<P::Iface>, ExtensionError> {
        self.ensure_loaded();
        Ok(self
            .adaptive
            .get_or_init(|| P::adaptive(ExtensionRegistry::<P>::global()))
            .clone())
    }

    /// Resolve an explicit, hand-registered adaptive class token rather than
    /// the one built from [`ExtensionPoint::adaptive`]. Used by bootstrap
    /// points that register their adaptive class directly via
    /// [`Self::register_adaptive`].
    pub fn get_registered_adaptive(&self) -> Result<Arc<P::Iface>, ExtensionError> {
        self.ensure_loaded();
        let token = self.adaptive_token.get().ok_or_else(|| ExtensionError::IllegalState(
            format!("point '{}' has no class registered with Role::Adaptive", P::TYPE_TAG)
        ))?;
        let entry = self.classes.get(token.as_str()).ok_or_else(|| ExtensionError::IllegalState(
            format!("adaptive class token '{token}' is not registered")
        ))?;
        match &entry.factory {
            ClassFactory::Adaptive { build } => Ok(build()),
            _ => Err(ExtensionError::IllegalState(format!("class token '{token}' is not Role::Adaptive"))),
        }
    }

    /// All implementations that should auto-activate for `url`, in order,
    /// given an explicit `names` list (supporting `default`, `-name`, and
    /// `-default` the way a caller would pass them on a command line) and an
    /// optional activation group.
    pub fn get_activate(
        &self,
        url: &Url,
        names: &[String],
        group: Option<&str>,
    ) -> Result<Vec<Arc<P::Iface>>, ExtensionError> {
        self.ensure_loaded();
        let suppress_default = names.iter().any(|n| n == "-default");
        let removed: Vec<&str> = names
            .iter()
            .filter(|n| n.starts_with('-') && n.as_str() != "-default")
            .map(|n| &n[1..])
            .collect();

        let implicit_names: Vec<String> = if suppress_default {
            Vec::new()
        } else {
            let candidates: Vec<(String, ActivationMeta)> = self
                .activation_by_name
                .iter()
                .filter(|entry| {
                    let name = entry.key();
                    !removed.contains(&name.as_str()) && entry.value().matches_group(group) && entry.value().matches_keys(url)
                })
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect();
            order_candidates(candidates)
        };

        let mut explicit = Vec::new();
        let mut placed_default = false;
        for n in names {
            if n.starts_with('-') {
                continue;
            }
            if n == "default" {
                explicit.extend(implicit_names.iter().cloned());
                placed_default = true;
            } else {
                explicit.push(n.clone());
            }
        }
        let ordered = if placed_default {
            explicit
        } else {
            let mut combined = implicit_names;
            combined.extend(explicit);
            combined
        };

        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for name in ordered {
            if seen.insert(name.clone()) {
                result.push(self.get(&name)?);
            }
        }
        Ok(result)
    }

    /// True if `name` currently resolves to a loaded, registered ordinary
    /// implementation, without constructing it.
    pub fn has(&self, name: &str) -> bool {
        self.ensure_loaded();
        self.name_to_token
            .get(name)
            .map(|token| matches!(self.classes.get(token.value().as_str()).map(|e| e.role), Some(Role::Ordinary)))
            .unwrap_or(false)
    }

    /// Every name loaded (or programmatically added) so far.
    pub fn supported_names(&self) -> Vec<String> {
        self.ensure_loaded();
        self.name_to_token.iter().map(|e| e.key().clone()).collect()
    }

    /// Alias for [`Self::supported_names`], matching the descriptor-loader's
    /// own vocabulary for what it produced.
    pub fn loaded_names(&self) -> Vec<String> {
        self.supported_names()
    }
}
