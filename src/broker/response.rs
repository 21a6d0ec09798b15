//! Uniform response envelopes returned to callers.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{_prelude::*, auth};

const MASK: &str = "***";
const SENSITIVE_KEY_PARTS: [&str; 4] = ["token", "secret", "password", "key"];

/// Connection state reported in [`ResponseData::status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
	/// Credential stored and channel connected.
	Connected,
	/// Credential disconnected.
	Disconnected,
	/// The tenant must visit the authorization URL first.
	AuthorizationRequired,
	/// The provider rejected the stored credential.
	Invalid,
}

/// Action-specific payload of a success envelope.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponseData {
	/// Provider key.
	pub provider: String,
	/// Resulting connection state.
	pub status: ConnectionState,
	/// Masked provider profile.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub profile: Option<JsonValue>,
	/// Access-token expiry (RFC 3339).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<String>,
	/// URL the tenant must visit to grant access.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub authorization_url: Option<Url>,
	/// Probe verdict for validate actions.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub valid: Option<bool>,
}
impl ResponseData {
	/// Creates data carrying only the provider and state.
	pub fn new(provider: impl Into<String>, status: ConnectionState) -> Self {
		Self {
			provider: provider.into(),
			status,
			profile: None,
			expires_at: None,
			authorization_url: None,
			valid: None,
		}
	}

	/// Attaches a profile after masking sensitive keys.
	pub fn with_profile(mut self, profile: Option<JsonValue>) -> Self {
		self.profile = profile.map(|mut profile| {
			mask_profile(&mut profile);

			profile
		});

		self
	}

	/// Attaches the access-token expiry.
	pub fn with_expires_at(mut self, expires_at: Option<OffsetDateTime>) -> Self {
		self.expires_at = expires_at.and_then(|at| at.format(&Rfc3339).ok());

		self
	}

	/// Attaches the authorization URL.
	pub fn with_authorization_url(mut self, url: Url) -> Self {
		self.authorization_url = Some(url);

		self
	}

	/// Attaches the probe verdict.
	pub fn with_valid(mut self, valid: bool) -> Self {
		self.valid = Some(valid);

		self
	}
}

/// Successful action result before it is wrapped in an envelope.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionReport {
	/// Human-readable summary.
	pub message: String,
	/// Action payload.
	pub data: ResponseData,
}

/// `{ success: true, message, data }`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SuccessBody {
	/// Always `true`.
	pub success: bool,
	/// Human-readable summary.
	pub message: String,
	/// Action payload.
	pub data: ResponseData,
}

/// `{ success: false, error, timestamp }`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailureBody {
	/// Always `false`.
	pub success: bool,
	/// Error text with request secrets scrubbed.
	pub error: String,
	/// Failure instant (RFC 3339).
	pub timestamp: String,
}

/// Uniform envelope returned by [`crate::broker::Broker::handle`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
	/// Action succeeded.
	Success(SuccessBody),
	/// Action failed.
	Failure(FailureBody),
}
impl ResponseEnvelope {
	/// Wraps a successful report.
	pub fn success(report: ActionReport) -> Self {
		Self::Success(SuccessBody { success: true, message: report.message, data: report.data })
	}

	/// Wraps `error`, replacing every occurrence of `secrets` in its text.
	pub fn failure(error: &Error, secrets: &[String]) -> Self {
		let now = OffsetDateTime::now_utc();

		Self::Failure(FailureBody {
			success: false,
			error: auth::redact(error.to_string(), secrets.iter().map(String::as_str)),
			timestamp: now.format(&Rfc3339).unwrap_or_else(|_| now.unix_timestamp().to_string()),
		})
	}

	/// Returns `true` for success envelopes.
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	/// Action payload of a success envelope.
	pub fn data(&self) -> Option<&ResponseData> {
		match self {
			Self::Success(body) => Some(&body.data),
			Self::Failure(_) => None,
		}
	}

	/// Error text of a failure envelope.
	pub fn error(&self) -> Option<&str> {
		match self {
			Self::Success(_) => None,
			Self::Failure(body) => Some(&body.error),
		}
	}
}

/// Replaces values under sensitive keys with `***`, recursively.
pub fn mask_profile(value: &mut JsonValue) {
	match value {
		JsonValue::Object(map) =>
			for (key, entry) in map.iter_mut() {
				let lowered = key.to_ascii_lowercase();

				if SENSITIVE_KEY_PARTS.iter().any(|part| lowered.contains(part)) {
					*entry = JsonValue::String(MASK.into());
				} else {
					mask_profile(entry);
				}
			},
		JsonValue::Array(items) => items.iter_mut().for_each(mask_profile),
		_ => {},
	}
}
