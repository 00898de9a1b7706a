//! Typed configuration for a Vela process: a small typed wrapper over
//! environment-variable input, with sensible defaults and a builder for
//! tests. Deliberately lighter than a full YAML+profile+secrets config
//! layer since Vela has no HTTP-facing profile concept — just the handful
//! of knobs the extension engine and codec actually need.

use std::path::PathBuf;
use std::time::Duration;

use vela_core::loader::FileSystemResourceLoader;

const DEFAULT_PAYLOAD_LIMIT: usize = 8 * 1024 * 1024;
const DEFAULT_SERIALIZER_ID: u8 = 2;
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_GRACE: Duration = Duration::from_secs(60);

/// Configuration for a Vela process: descriptor search roots, codec limits,
/// and correlation-store timing.
#[derive(Debug, Clone)]
pub struct VelaConfig {
    descriptor_roots: Vec<PathBuf>,
    payload_limit: usize,
    default_serializer_id: u8,
    correlation_sweep_interval: Duration,
    correlation_grace: Duration,
}

impl Default for VelaConfig {
    fn default() -> Self {
        Self {
            descriptor_roots: vec![
                PathBuf::from("META-VELA/internal"),
                PathBuf::from("META-VELA/vela"),
                PathBuf::from("META-VELA/services"),
            ],
            payload_limit: DEFAULT_PAYLOAD_LIMIT,
            default_serializer_id: DEFAULT_SERIALIZER_ID,
            correlation_sweep_interval: DEFAULT_SWEEP_INTERVAL,
            correlation_grace: DEFAULT_GRACE,
        }
    }
}

impl VelaConfig {
    /// An empty-ish config carrying only the built-in defaults, with no
    /// environment lookups. Useful for tests that want a predictable
    /// starting point before applying `with_*` overrides.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a config from `VELA_`-prefixed environment variables, falling
    /// back to defaults for anything unset or unparsable.
    ///
    /// - `VELA_DESCRIPTOR_ROOTS`: `:`-separated list of directories, replaces
    ///   all three default roots wholesale.
    /// - `VELA_PAYLOAD_LIMIT`: max frame body size in bytes.
    /// - `VELA_DEFAULT_SERIALIZER_ID`: frame-header serializer id to encode
    ///   with when none is otherwise specified.
    /// - `VELA_CORRELATION_SWEEP_INTERVAL_MS` / `VELA_CORRELATION_GRACE_MS`:
    ///   the correlation store's background sweep cadence and grace window.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(roots) = std::env::var("VELA_DESCRIPTOR_ROOTS") {
            let parsed: Vec<PathBuf> = roots.split(':').filter(|s| !s.is_empty()).map(PathBuf::from).collect();
            if !parsed.is_empty() {
                cfg.descriptor_roots = parsed;
            }
        }
        if let Some(v) = parse_env("VELA_PAYLOAD_LIMIT") {
            cfg.payload_limit = v;
        }
        if let Some(v) = parse_env("VELA_DEFAULT_SERIALIZER_ID") {
            cfg.default_serializer_id = v;
        }
        if let Some(ms) = parse_env::<u64>("VELA_CORRELATION_SWEEP_INTERVAL_MS") {
            cfg.correlation_sweep_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_env::<u64>("VELA_CORRELATION_GRACE_MS") {
            cfg.correlation_grace = Duration::from_millis(ms);
        }

        tracing::debug!(
            roots = ?cfg.descriptor_roots,
            payload_limit = cfg.payload_limit,
            serializer_id = cfg.default_serializer_id,
            "loaded VelaConfig from environment"
        );
        cfg
    }

    pub fn with_descriptor_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.descriptor_roots = roots;
        self
    }

    pub fn with_payload_limit(mut self, limit: usize) -> Self {
        self.payload_limit = limit;
        self
    }

    pub fn with_default_serializer_id(mut self, id: u8) -> Self {
        self.default_serializer_id = id;
        self
    }

    pub fn with_correlation_timing(mut self, sweep_interval: Duration, grace: Duration) -> Self {
        self.correlation_sweep_interval = sweep_interval;
        self.correlation_grace = grace;
        self
    }

    pub fn descriptor_roots(&self) -> &[PathBuf] {
        &self.descriptor_roots
    }

    pub fn payload_limit(&self) -> usize {
        self.payload_limit
    }

    pub fn default_serializer_id(&self) -> u8 {
        self.default_serializer_id
    }

    pub fn correlation_sweep_interval(&self) -> Duration {
        self.correlation_sweep_interval
    }

    pub fn correlation_grace(&self) -> Duration {
        self.correlation_grace
    }

    /// Build a resource loader over this config's descriptor roots.
    pub fn resource_loader(&self) -> FileSystemResourceLoader {
        FileSystemResourceLoader::with_roots(self.descriptor_roots.to_vec())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
