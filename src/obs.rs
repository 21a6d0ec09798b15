//! Optional observability helpers for broker actions.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `marketplace_auth_broker.action` with the
//!   `action` and `provider` fields.
//! - Enable `metrics` to increment the `marketplace_auth_broker_action_total` counter for every
//!   attempt/success/failure, labeled by `action` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Broker actions observed by the span and counter helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
	/// Connect a tenant to a provider.
	Authenticate,
	/// Rotate an OAuth2 access token.
	Refresh,
	/// Probe a stored credential.
	Validate,
	/// Soft-disconnect a credential.
	Disconnect,
}
impl ActionKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ActionKind::Authenticate => "authenticate",
			ActionKind::Refresh => "refresh",
			ActionKind::Validate => "validate",
			ActionKind::Disconnect => "disconnect",
		}
	}
}
impl Display for ActionKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionOutcome {
	/// Entry to a broker action.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure returned to the caller.
	Failure,
}
impl ActionOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ActionOutcome::Attempt => "attempt",
			ActionOutcome::Success => "success",
			ActionOutcome::Failure => "failure",
		}
	}
}
impl Display for ActionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
