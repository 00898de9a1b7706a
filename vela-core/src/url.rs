//! The parameter bag that drives adaptive dispatch and serializer selection.
//!
//! `Url` is deliberately narrow: a protocol scheme, an `address` (host:port or
//! similar opaque locator), and a flat string→string parameter map. It is not
//! a general URI type — there is no path/fragment handling — because nothing
//! in the extension engine or codec needs one.

use std::collections::BTreeMap;
use std::fmt;

/// An immutable parameter bag identifying an endpoint and the query-style
/// parameters that accompany it.
///
/// Cheap to clone: parameters are stored in a `BTreeMap` and cloning an
/// already-built `Url` is the common case (adaptive dispatch never mutates
/// the URL it was handed, only reads from it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    protocol: String,
    address: String,
    params: BTreeMap<String, String>,
}

/// Error returned by [`Url::parse`] for a malformed `scheme://address` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParseError(pub String);

impl fmt::Display for UrlParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid url: {}", self.0)
    }
}

impl std::error::Error for UrlParseError {}

impl Url {
    /// Build a `Url` from its parts directly, skipping string parsing.
    pub fn new(protocol: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            address: address.into(),
            params: BTreeMap::new(),
        }
    }

    /// Parse a `scheme://address[/path][?k=v&...]` string.
    ///
    /// Only the scheme, authority, and query string are kept; path segments
    /// are discarded since no adaptive key plan in this crate keys on them.
    pub fn parse(raw: &str) -> Result<Self, UrlParseError> {
        let (protocol, rest) = raw
            .split_once("://")
            .ok_or_else(|| UrlParseError(raw.to_string()))?;
        if protocol.is_empty() {
            return Err(UrlParseError(raw.to_string()));
        }
        let (authority_and_path, query) = match rest.split_once('?') {
            Some((a, q)) => (a, Some(q)),
            None => (rest, None),
        };
        let address = authority_and_path
            .split_once('/')
            .map(|(a, _)| a)
            .unwrap_or(authority_and_path)
            .to_string();

        let mut params = BTreeMap::new();
        if let Some(q) = query {
            for pair in q.split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some((k, v)) => {
                        params.insert(k.to_string(), v.to_string());
                    }
                    None => {
                        params.insert(pair.to_string(), String::new());
                    }
                }
            }
        }

        Ok(Self {
            protocol: protocol.to_string(),
            address,
            params,
        })
    }

    /// The scheme, e.g. `dubbo` in `dubbo://host:20880`.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// The host:port (or other opaque locator) portion.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Raw access to the parameter map, e.g. for the activation filter's
    /// `ends-with(".key")` matching.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Set a parameter, returning the updated `Url` (builder-style).
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Look up a plain parameter, falling back to `default` when absent or empty.
    pub fn parameter(&self, key: &str, default: Option<&str>) -> Option<String> {
        match self.params.get(key) {
            Some(v) if !v.is_empty() => Some(v.clone()),
            _ => default.map(str::to_string),
        }
    }

    /// Look up a method-scoped parameter: `<method>.<key>` first, then the
    /// plain `<key>`, then `default`. Mirrors the two-level lookup adaptive
    /// method dispatch uses when an `Invocation` is present.
    pub fn method_parameter(&self, method: &str, key: &str, default: Option<&str>) -> Option<String> {
        let scoped = format!("{method}.{key}");
        if let Some(v) = self.params.get(&scoped) {
            if !v.is_empty() {
                return Some(v.clone());
            }
        }
        self.parameter(key, default)
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.address)?;
        if !self.params.is_empty() {
            write!(f, "?")?;
            for (i, (k, v)) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, "&")?;
                }
                write!(f, "{k}={v}")?;
            }
        }
        Ok(())
    }
}
