//! Vela: a descriptor-driven extension-resolution engine ([`vela_core`]) and
//! a length-prefixed exchange codec ([`vela_codec`]), bundled behind one
//! facade crate with shared config and logging setup.
//!
//! Most callers want [`prelude`]; `init_tracing` and [`config::VelaConfig`]
//! are the two pieces of ambient plumbing every binary built on Vela needs.

pub mod config;
pub mod logging;
pub mod prelude;

pub use config::VelaConfig;
pub use logging::init_tracing;

pub use vela_codec;
pub use vela_core;
