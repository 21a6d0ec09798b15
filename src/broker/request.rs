//! Tagged action requests accepted by the broker.

// self
use crate::{
	_prelude::*,
	auth::{ChannelRef, CredentialPayload, Secret},
	obs::ActionKind,
};

/// One broker action with only the fields it needs.
///
/// Deserializes from `{ "action": "authenticate" | "refresh" | "validate" | "disconnect", ... }`.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuthRequest {
	/// Connect the tenant to a provider.
	Authenticate(AuthenticateRequest),
	/// Rotate the stored OAuth2 access token.
	Refresh(RefreshRequest),
	/// Probe the stored credential.
	Validate(ValidateRequest),
	/// Soft-disconnect the stored credential.
	Disconnect(DisconnectRequest),
}
impl AuthRequest {
	/// Shorthand for a refresh request.
	pub fn refresh(provider: impl Into<String>) -> Self {
		Self::Refresh(RefreshRequest { provider: provider.into() })
	}

	/// Shorthand for a validate request.
	pub fn validate(provider: impl Into<String>) -> Self {
		Self::Validate(ValidateRequest { provider: provider.into() })
	}

	/// Shorthand for a disconnect request mirrored onto the default channel.
	pub fn disconnect(provider: impl Into<String>) -> Self {
		Self::Disconnect(DisconnectRequest { provider: provider.into(), channel_ref: None })
	}

	/// Action label.
	pub fn kind(&self) -> ActionKind {
		match self {
			Self::Authenticate(_) => ActionKind::Authenticate,
			Self::Refresh(_) => ActionKind::Refresh,
			Self::Validate(_) => ActionKind::Validate,
			Self::Disconnect(_) => ActionKind::Disconnect,
		}
	}

	/// Provider key as supplied by the caller.
	pub fn provider(&self) -> &str {
		match self {
			Self::Authenticate(req) => &req.provider,
			Self::Refresh(req) => &req.provider,
			Self::Validate(req) => &req.provider,
			Self::Disconnect(req) => &req.provider,
		}
	}

	/// Secret values carried by the request, used to scrub failure text.
	pub(crate) fn secret_values(&self) -> Vec<String> {
		match self {
			Self::Authenticate(req) => req
				.credentials
				.secret_values()
				.chain(req.code.as_ref().map(Secret::expose))
				.map(str::to_owned)
				.collect(),
			_ => Vec::new(),
		}
	}
}
impl From<AuthenticateRequest> for AuthRequest {
	fn from(value: AuthenticateRequest) -> Self {
		Self::Authenticate(value)
	}
}

/// Fields of an authenticate action.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthenticateRequest {
	/// Provider key.
	pub provider: String,
	/// Credential fields supplied by the tenant.
	#[serde(default)]
	pub credentials: CredentialPayload,
	/// OAuth2 redirect URI registered with the provider.
	#[serde(default)]
	pub redirect_uri: Option<String>,
	/// OAuth2 authorization code returned to the redirect URI.
	#[serde(default)]
	pub code: Option<Secret>,
	/// Channel record to mirror; defaults to the provider key.
	#[serde(default)]
	pub channel_ref: Option<ChannelRef>,
}
impl AuthenticateRequest {
	/// Creates a request for `provider` carrying `credentials`.
	pub fn new(provider: impl Into<String>, credentials: CredentialPayload) -> Self {
		Self {
			provider: provider.into(),
			credentials,
			redirect_uri: None,
			code: None,
			channel_ref: None,
		}
	}

	/// Sets the redirect URI.
	pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
		self.redirect_uri = Some(redirect_uri.into());

		self
	}

	/// Sets the authorization code.
	pub fn with_code(mut self, code: impl Into<Secret>) -> Self {
		self.code = Some(code.into());

		self
	}

	/// Sets the channel record to mirror.
	pub fn with_channel(mut self, channel: ChannelRef) -> Self {
		self.channel_ref = Some(channel);

		self
	}
}

/// Fields of a refresh action.
#[derive(Clone, Debug, Deserialize)]
pub struct RefreshRequest {
	/// Provider key.
	pub provider: String,
}

/// Fields of a validate action.
#[derive(Clone, Debug, Deserialize)]
pub struct ValidateRequest {
	/// Provider key.
	pub provider: String,
}

/// Fields of a disconnect action.
#[derive(Clone, Debug, Deserialize)]
pub struct DisconnectRequest {
	/// Provider key.
	pub provider: String,
	/// Channel record to mirror; defaults to the provider key.
	#[serde(default)]
	pub channel_ref: Option<ChannelRef>,
}
