//! Provider-facing flows: OAuth2 token exchanges, static-key validation, and connection probes.
//!
//! Flows never touch storage. The broker composes them and owns every side effect.

pub mod api_key;
pub mod oauth2;
pub mod probe;

pub use api_key::*;
pub use oauth2::*;
pub use probe::*;
