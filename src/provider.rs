//! Provider-facing configuration and the immutable registry the broker consults.
//!
//! `config` exposes validated metadata (`ProviderConfig`) covering auth type, HTTPS-only
//! endpoints, scopes, required credential fields, and how static keys are attached to probe
//! requests. `registry` builds the lookup table once; `catalog` ships the built-in
//! marketplace set.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod registry;

pub use builder::*;
pub use config::*;
pub use registry::*;
