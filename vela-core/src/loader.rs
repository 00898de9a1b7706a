//! Descriptor file parsing: turns `name[,name]*=token` lines under each
//! search root into the name/wrapper/adaptive tables a registry composes
//! implementations from.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use dashmap::DashMap;

use crate::activation::ActivationMeta;
use crate::error::ExtensionError;
use crate::point::ExtensionPoint;
use crate::registry::{ClassEntry, Role};

/// Supplies descriptor file contents for a given extension-point type tag.
/// Implement this to load from somewhere other than the filesystem (an
/// embedded resource bundle, a test fixture directory, ...).
pub trait ResourceLoader: Send + Sync + 'static {
    /// Return `(source description, file contents)` for every descriptor
    /// resource found for `type_tag`, across however many search roots this
    /// loader knows about. Order matters: later entries can add names but a
    /// name collision with a different token across entries is fatal.
    fn resources(&self, type_tag: &str) -> Vec<(String, String)>;
}

/// Reads descriptor files named `<root>/<type_tag>` from an ordered list of
/// filesystem directories, mirroring the internal/user/legacy three-root
/// convention: an inner framework root, a user-facing root, and a legacy
/// root kept for backward compatibility. Missing roots or files are silently
/// skipped; unreadable (permission-denied, not-UTF8) files are logged and
/// skipped rather than failing the whole load.
pub struct FileSystemResourceLoader {
    roots: Vec<PathBuf>,
}

impl Default for FileSystemResourceLoader {
    fn default() -> Self {
        Self {
            roots: vec![
                PathBuf::from("META-VELA/internal"),
                PathBuf::from("META-VELA/vela"),
                PathBuf::from("META-VELA/services"),
            ],
        }
    }
}

impl FileSystemResourceLoader {
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl ResourceLoader for FileSystemResourceLoader {
    fn resources(&self, type_tag: &str) -> Vec<(String, String)> {
        let mut found = Vec::new();
        for root in &self.roots {
            let path = root.join(type_tag);
            match fs::read_to_string(&path) {
                Ok(contents) => found.push((path.display().to_string(), contents)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read descriptor file");
                }
            }
        }
        found
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Derive a name from a bare class token line (no `=`): the token itself,
/// with any trailing `-<type_tag>` suffix trimmed.
fn derive_name(token: &str, type_tag: &str) -> String {
    token
        .strip_suffix(&format!("-{type_tag}"))
        .unwrap_or(token)
        .to_string()
}

fn parse_line(line: &str, type_tag: &str) -> Option<(Vec<String>, String)> {
    let line = strip_comment(line).trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once('=') {
        Some((names, token)) => {
            let names: Vec<String> = names.split(',').map(|n| n.trim().to_string()).filter(|n| !n.is_empty()).collect();
            let token = token.trim().to_string();
            if token.is_empty() {
                return None;
            }
            Some((names, token))
        }
        None => {
            let token = line.to_string();
            let name = derive_name(&token, type_tag);
            Some((vec![name], token))
        }
    }
}

/// Borrowed handles to the registry's concurrent state that loading (and
/// later `add`/`replace` calls) populate. Kept as a reference bundle rather
/// than given its own owned type, since the registry is the thing that
/// outlives a single `load` call.
pub(crate) struct LoadTarget<'a> {
    pub name_to_token: &'a DashMap<String, String>,
    pub wrapper_tokens: &'a Mutex<Vec<String>>,
    pub adaptive_token: &'a OnceLock<String>,
    pub activation_by_name: &'a DashMap<String, ActivationMeta>,
    pub errors: &'a Mutex<Vec<String>>,
}

/// Parse every descriptor resource for `P` and populate `target`. Returns an
/// error only for the two fatal conflict classes (duplicate adaptive class,
/// duplicate name pointing at different tokens); everything else is recorded
/// into `target.errors` and skipped.
pub(crate) fn load<P: ExtensionPoint>(
    classes: &DashMap<&'static str, ClassEntry<P>>,
    loader: &dyn ResourceLoader,
    target: &LoadTarget<'_>,
) -> Result<(), ExtensionError> {
    for (source, contents) in loader.resources(P::TYPE_TAG) {
        for raw_line in contents.lines() {
            let Some((names, token)) = parse_line(raw_line, P::TYPE_TAG) else {
                continue;
            };

            let Some(entry) = classes.get(token.as_str()) else {
                target.errors.lock().unwrap().push(format!("{source}: class token '{token}' is not registered"));
                continue;
            };
            let role = entry.role;
            let activation = entry.activation.clone();
            drop(entry);

            match role {
                Role::Adaptive => {
                    if let Some(existing) = target.adaptive_token.get() {
                        if existing != &token {
                            return Err(ExtensionError::DuplicateAdaptive {
                                point: P::TYPE_TAG,
                                first: existing.clone(),
                                second: token.clone(),
                            });
                        }
                    } else {
                        let _ = target.adaptive_token.set(token.clone());
                    }
                }
                Role::Wrapper => {
                    let mut wrappers = target.wrapper_tokens.lock().unwrap();
                    if !wrappers.contains(&token) {
                        wrappers.push(token.clone());
                    }
                }
                Role::Ordinary => {}
            }

            if let (Some(first), Some(meta)) = (names.first(), activation) {
                target.activation_by_name.insert(first.clone(), meta);
            }

            for name in &names {
                match target.name_to_token.get(name) {
                    Some(existing) if existing.value() != &token => {
                        let existing = existing.value().clone();
                        return Err(ExtensionError::DuplicateName {
                            point: P::TYPE_TAG,
                            name: name.clone(),
                            first: existing,
                            second: token.clone(),
                        });
                    }
                    _ => {
                        target.name_to_token.insert(name.clone(), token.clone());
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_bare_lines() {
        assert_eq!(
            parse_line("dubbo,dubbo-rpc=vela-dubbo-protocol", "protocol"),
            Some((vec!["dubbo".into(), "dubbo-rpc".into()], "vela-dubbo-protocol".into()))
        );
        assert_eq!(
            parse_line("vela-dubbo-protocol", "protocol"),
            Some((vec!["vela-dubbo".into()], "vela-dubbo-protocol".into()))
        );
    }

    #[test]
    fn strips_comments_and_blank_lines() {
        assert_eq!(parse_line("   # a full comment", "protocol"), None);
        assert_eq!(parse_line("", "protocol"), None);
        assert_eq!(
            parse_line("dubbo=vela-dubbo-protocol # trailing", "protocol"),
            Some((vec!["dubbo".into()], "vela-dubbo-protocol".into()))
        );
    }
}
