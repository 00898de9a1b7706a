//! Activation metadata and the group/key filter used by
//! [`crate::registry::ExtensionRegistry::get_activate`].

use crate::url::Url;

/// Declares when an implementation should be auto-included by
/// `get_activate`, attached at registration time (there is no runtime
/// annotation reflection to pull this from, so callers state it explicitly).
#[derive(Debug, Clone, Default)]
pub struct ActivationMeta {
    /// Groups this implementation activates for. `None` activates for any
    /// requested group.
    pub group: Option<Vec<String>>,
    /// URL parameter keys that must be present (and non-empty, matching
    /// either the bare key or any `<prefix>.<key>`) for this implementation
    /// to activate. Empty means "always, once the group matches".
    pub keys: Vec<&'static str>,
    /// Names this implementation should sort before.
    pub before: Vec<&'static str>,
    /// Names this implementation should sort after.
    pub after: Vec<&'static str>,
    /// Tie-break order; lower sorts earlier.
    pub order: i32,
}

impl ActivationMeta {
    pub fn matches_group(&self, requested: Option<&str>) -> bool {
        match (requested, &self.group) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(g), Some(groups)) => groups.iter().any(|x| x == g),
        }
    }

    pub fn matches_keys(&self, url: &Url) -> bool {
        if self.keys.is_empty() {
            return true;
        }
        self.keys.iter().any(|k| {
            url.params().iter().any(|(pk, pv)| {
                !pv.is_empty() && (pk == k || pk.ends_with(&format!(".{k}")))
            })
        })
    }
}

/// Order a set of `(name, meta)` candidates by `order`, breaking ties
/// lexicographically, then nudge entries to respect `before`/`after` hints.
///
/// This is a bounded best-effort pass, not a full topological sort: cyclic
/// before/after hints are left in whatever order the `order`/name sort
/// produced rather than rejected, since activation ordering is a UX nicety,
/// not a correctness requirement.
pub fn order_candidates(mut candidates: Vec<(String, ActivationMeta)>) -> Vec<String> {
    candidates.sort_by(|a, b| a.1.order.cmp(&b.1.order).then_with(|| a.0.cmp(&b.0)));
    let mut names: Vec<String> = candidates.iter().map(|(n, _)| n.clone()).collect();
    let metas: std::collections::HashMap<String, ActivationMeta> =
        candidates.into_iter().collect();

    for _ in 0..names.len() {
        let mut moved = false;
        for i in 0..names.len() {
            let meta = &metas[&names[i]];
            for before in &meta.before {
                if let Some(j) = names.iter().position(|n| n == before) {
                    if j < i {
                        let item = names.remove(i);
                        names.insert(j, item);
                        moved = true;
                    }
                }
            }
            let meta = &metas[&names[i]];
            for after in &meta.after {
                if let Some(j) = names.iter().position(|n| n == after) {
                    if j > i {
                        let item = names.remove(i);
                        names.insert(j, item);
                        moved = true;
                    }
                }
            }
        }
        if !moved {
            break;
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_match_empty_request_matches_all() {
        let meta = ActivationMeta {
            group: Some(vec!["provider".into()]),
            ..Default::default()
        };
        assert!(meta.matches_group(None));
        assert!(meta.matches_group(Some("provider")));
        assert!(!meta.matches_group(Some("consumer")));
    }

    #[test]
    fn key_match_checks_suffix_and_bare() {
        let meta = ActivationMeta {
            keys: vec!["cache"],
            ..Default::default()
        };
        let url = Url::new("dubbo", "host").with_parameter("sayHello.cache", "lru");
        assert!(meta.matches_keys(&url));
        let url_empty = Url::new("dubbo", "host").with_parameter("sayHello.cache", "");
        assert!(!meta.matches_keys(&url_empty));
    }

    #[test]
    fn before_hint_moves_entry_earlier() {
        let a = ActivationMeta { order: 0, ..Default::default() };
        let mut b = ActivationMeta { order: 0, ..Default::default() };
        b.before = vec!["a"];
        let ordered = order_candidates(vec![("a".into(), a), ("b".into(), b)]);
        assert_eq!(ordered, vec!["b".to_string(), "a".to_string()]);
    }
}
