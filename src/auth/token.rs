//! Token sets returned by OAuth2 token endpoints.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPayload, Secret, fields},
};

/// Access/refresh token pair issued by a provider token endpoint.
#[derive(Clone, Debug)]
pub struct TokenSet {
	/// Access token secret.
	pub access_token: Secret,
	/// Refresh token secret; `None` when the provider did not rotate it.
	pub refresh_token: Option<Secret>,
	/// Relative lifetime reported by the provider.
	pub expires_in: Option<Duration>,
	/// Token type (usually `bearer`).
	pub token_type: Option<String>,
	/// Scope string echoed by the provider.
	pub scope: Option<String>,
	/// Instant the response was received.
	pub issued_at: OffsetDateTime,
}
impl TokenSet {
	/// Absolute expiry derived from `issued_at + expires_in`; `None` when it is not representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_in.and_then(|lifetime| self.issued_at.checked_add(lifetime))
	}

	/// Writes the token fields into `payload`.
	///
	/// Access token and expiry are always rotated. The refresh token is only replaced when the
	/// provider issued a new one, so a previously stored refresh token survives rotations that
	/// omit it.
	pub fn apply_to(&self, payload: &mut CredentialPayload) {
		payload.insert(fields::ACCESS_TOKEN, self.access_token.clone());

		if let Some(refresh) = &self.refresh_token {
			payload.insert(fields::REFRESH_TOKEN, refresh.clone());
		}

		match (self.expires_in, self.expires_at()) {
			(Some(lifetime), Some(expires_at)) => {
				payload.insert(fields::EXPIRES_IN, lifetime.whole_seconds().to_string());
				payload.insert(fields::EXPIRES_AT, expires_at.unix_timestamp().to_string());
			},
			_ => {
				payload.remove(fields::EXPIRES_IN);
				payload.remove(fields::EXPIRES_AT);
			},
		}

		if let Some(token_type) = &self.token_type {
			payload.insert(fields::TOKEN_TYPE, token_type.as_str());
		}
	}
}
