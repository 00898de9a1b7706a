//! `use vela::prelude::*;` for the whole public surface: extension points
//! from `vela-core` plus the wire protocol from `vela-codec`.

pub use vela_core::prelude::*;

pub use vela_codec::prelude::*;

pub use crate::config::VelaConfig;
pub use crate::logging::init_tracing;
