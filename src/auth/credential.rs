//! Per-tenant credential records and their secret payloads.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{ProviderId, Secret, TenantId},
};

/// Well-known payload field names shared by flows and stores.
pub mod fields {
	/// OAuth2 access token.
	pub const ACCESS_TOKEN: &str = "access_token";
	/// OAuth2 refresh token.
	pub const REFRESH_TOKEN: &str = "refresh_token";
	/// Lifetime in seconds reported by the token endpoint.
	pub const EXPIRES_IN: &str = "expires_in";
	/// Absolute expiry as unix seconds, derived when the token was issued.
	pub const EXPIRES_AT: &str = "expires_at";
	/// Token type reported by the token endpoint.
	pub const TOKEN_TYPE: &str = "token_type";
	/// OAuth2 client identifier.
	pub const CLIENT_ID: &str = "client_id";
	/// OAuth2 client secret.
	pub const CLIENT_SECRET: &str = "client_secret";
}

/// Lifecycle status of a stored credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
	/// Credential is usable and the channel is connected.
	Active,
	/// Credential was disconnected; the record is retained for history.
	Disconnected,
}
impl CredentialStatus {
	/// Returns the persisted label.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialStatus::Active => "active",
			CredentialStatus::Disconnected => "disconnected",
		}
	}
}
impl Display for CredentialStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Opaque mapping of credential field names to secret values.
///
/// Field names are ordered so fingerprints stay stable across backends.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialPayload(BTreeMap<String, Secret>);
impl CredentialPayload {
	/// Creates an empty payload.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a payload from `(name, value)` pairs.
	pub fn from_fields<I, K, V>(fields: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<Secret>,
	{
		Self(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	/// Adds or replaces a field, consuming the payload.
	pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Secret>) -> Self {
		self.insert(name, value);

		self
	}

	/// Adds or replaces a field, returning the previous value.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Secret>) -> Option<Secret> {
		self.0.insert(name.into(), value.into())
	}

	/// Removes a field.
	pub fn remove(&mut self, name: &str) -> Option<Secret> {
		self.0.remove(name)
	}

	/// Returns the secret stored under `name`.
	pub fn get(&self, name: &str) -> Option<&Secret> {
		self.0.get(name)
	}

	/// Returns the raw value stored under `name`. Callers must avoid logging it.
	pub fn expose(&self, name: &str) -> Option<&str> {
		self.get(name).map(Secret::expose)
	}

	/// Returns `true` when `name` is present and not blank.
	pub fn has_value(&self, name: &str) -> bool {
		self.get(name).is_some_and(|value| !value.is_blank())
	}

	/// Returns the non-blank secret stored under `name`.
	pub fn non_blank(&self, name: &str) -> Option<&Secret> {
		self.get(name).filter(|value| !value.is_blank())
	}

	/// Iterates over field names without exposing values.
	pub fn field_names(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	/// Iterates over raw secret values; used to scrub messages before they leave the broker.
	pub fn secret_values(&self) -> impl Iterator<Item = &str> {
		self.0.values().map(Secret::expose)
	}

	/// Number of fields.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` if no fields are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Absolute token expiry recorded under [`fields::EXPIRES_AT`].
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let raw = self.expose(fields::EXPIRES_AT)?;
		let secs = raw.trim().parse::<i64>().ok()?;

		OffsetDateTime::from_unix_timestamp(secs).ok()
	}

	/// Stable digest of the payload, safe to log for correlation.
	///
	/// The value is a base64 (no padding) encoding of the SHA-256 digest over every
	/// `name=value` line in field order.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		for (name, value) in &self.0 {
			hasher.update(name.as_bytes());
			hasher.update(b"=");
			hasher.update(value.expose().as_bytes());
			hasher.update(b"\n");
		}

		STANDARD_NO_PAD.encode(hasher.finalize())
	}
}
impl Debug for CredentialPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPayload")
			.field("fields", &self.field_names().collect::<Vec<_>>())
			.finish()
	}
}

/// Credential record persisted once per tenant and provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCredential {
	/// Owning tenant.
	pub tenant: TenantId,
	/// Provider key the credential authenticates against.
	pub provider: ProviderId,
	/// Secret fields; never logged or echoed.
	pub payload: CredentialPayload,
	/// Connection lifecycle status.
	pub status: CredentialStatus,
	/// Last instant the payload was written after talking to the provider.
	pub last_sync: Option<OffsetDateTime>,
	/// First time the pair was stored.
	pub created_at: OffsetDateTime,
	/// Last mutation instant; used for optimistic concurrency.
	pub updated_at: OffsetDateTime,
}
impl TenantCredential {
	/// Creates a freshly stored record stamped with `now`.
	pub fn new(
		tenant: TenantId,
		provider: ProviderId,
		payload: CredentialPayload,
		status: CredentialStatus,
		now: OffsetDateTime,
	) -> Self {
		Self {
			tenant,
			provider,
			payload,
			status,
			last_sync: Some(now),
			created_at: now,
			updated_at: now,
		}
	}

	/// Returns `true` when the credential is active.
	pub fn is_active(&self) -> bool {
		matches!(self.status, CredentialStatus::Active)
	}

	/// Absolute access-token expiry, when the payload records one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.payload.expires_at()
	}

	/// Non-blank refresh token, if one was issued.
	pub fn refresh_token(&self) -> Option<&Secret> {
		self.payload.non_blank(fields::REFRESH_TOKEN)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn payload() -> CredentialPayload {
		CredentialPayload::from_fields([("api_key", "key-1"), ("seller_id", "seller-9")])
	}

	#[test]
	fn payload_debug_lists_names_only() {
		let rendered = format!("{:?}", payload());

		assert_eq!(rendered, "CredentialPayload { fields: [\"api_key\", \"seller_id\"] }");
		assert!(!rendered.contains("key-1"));
	}

	#[test]
	fn fingerprint_is_stable_and_value_sensitive() {
		let reordered =
			CredentialPayload::from_fields([("seller_id", "seller-9"), ("api_key", "key-1")]);

		assert_eq!(payload().fingerprint(), reordered.fingerprint());
		assert_ne!(payload().fingerprint(), payload().with_field("api_key", "key-2").fingerprint());
		assert!(!payload().fingerprint().contains("key-1"));
	}

	#[test]
	fn blank_values_are_not_counted_as_present() {
		let payload = payload().with_field("seller_id", "  ");

		assert!(payload.has_value("api_key"));
		assert!(!payload.has_value("seller_id"));
		assert!(!payload.has_value("missing"));
	}

	#[test]
	fn record_reads_expiry_and_refresh_token() {
		let now = macros::datetime!(2025-06-01 12:00 UTC);
		let payload = CredentialPayload::new()
			.with_field(fields::ACCESS_TOKEN, "t1")
			.with_field(fields::REFRESH_TOKEN, "r1")
			.with_field(fields::EXPIRES_AT, (now + Duration::hours(6)).unix_timestamp().to_string());
		let record = TenantCredential::new(
			TenantId::new("tenant-1").expect("Tenant fixture should be valid."),
			ProviderId::new("mercado_livre").expect("Provider fixture should be valid."),
			payload,
			CredentialStatus::Active,
			now,
		);

		assert!(record.is_active());
		assert_eq!(record.created_at, record.updated_at);
		assert_eq!(record.expires_at(), Some(macros::datetime!(2025-06-01 18:00 UTC)));
		assert_eq!(record.refresh_token().map(Secret::expose), Some("r1"));
	}
}
