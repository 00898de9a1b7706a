//! Process-wide table of bare (undecorated) implementation instances, keyed
//! by class token and shared across every extension point's registry.
//!
//! A class token registered as the ordinary implementation for one extension
//! point might also back an implementation of a second, unrelated point (the
//! same struct implementing two small traits). These "bare" instances are
//! shared process-wide, before wrapper composition runs, via a single table
//! outside any one `ExtensionRegistry<P>`; each `ExtensionRegistry` only does
//! the `Arc<dyn Any>` → `Arc<P::Iface>` narrowing for its own `Iface`.

use std::any::Any;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

type AnyInstance = Arc<dyn Any + Send + Sync>;

static BARE_INSTANCES: OnceLock<DashMap<String, Arc<OnceLock<AnyInstance>>>> = OnceLock::new();

fn table() -> &'static DashMap<String, Arc<OnceLock<AnyInstance>>> {
    BARE_INSTANCES.get_or_init(DashMap::new)
}

/// Return the bare instance for `token`, building it with `build` if this is
/// the first request for it anywhere in the process. `build` runs at most
/// once per token even under concurrent callers from different extension
/// points.
pub fn get_or_build_bare(token: &str, build: impl FnOnce() -> AnyInstance) -> AnyInstance {
    let cell = table()
        .entry(token.to_string())
        .or_insert_with(|| Arc::new(OnceLock::new()))
        .clone();
    cell.get_or_init(build).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn build_runs_exactly_once_under_concurrency() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let token: &'static str = "global-test-token-race";
        let barrier = Arc::new(Barrier::new(16));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    get_or_build_bare(token, || {
                        CALLS.fetch_add(1, Ordering::SeqCst);
                        Arc::new(42u32) as AnyInstance
                    })
                })
            })
            .collect();
        for h in handles {
            let instance = h.join().unwrap();
            assert_eq!(*instance.downcast::<u32>().unwrap(), 42);
        }
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
