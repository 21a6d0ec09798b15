//! Provider configuration data structures shared by all flows.

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{ProviderConfigBuilder, ProviderConfigError},
};

/// Authentication scheme used by a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
	/// OAuth2 authorization-code flow.
	#[serde(rename = "oauth2")]
	OAuth2,
	/// Static API key fields.
	ApiKey,
	/// Static fields plus an OAuth2 authorization-code flow.
	Hybrid,
}
impl AuthType {
	/// Returns the configuration label.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthType::OAuth2 => "oauth2",
			AuthType::ApiKey => "api_key",
			AuthType::Hybrid => "hybrid",
		}
	}

	/// Returns `true` when the scheme goes through the authorization-code flow.
	pub const fn uses_oauth2(self) -> bool {
		matches!(self, AuthType::OAuth2 | AuthType::Hybrid)
	}
}
impl Display for AuthType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How OAuth2 client credentials reach the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
}

/// Named endpoints a provider exposes for authenticated calls.
///
/// Only `profile` is consulted by the broker; the others document the provider surface for
/// the rest of the application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeEndpoints {
	/// Lightweight profile or shop-info endpoint used to validate credentials.
	pub profile: Option<Url>,
	/// Order listing endpoint.
	pub orders: Option<Url>,
	/// Product listing endpoint.
	pub products: Option<Url>,
	/// Inventory endpoint.
	pub inventory: Option<Url>,
}

/// Where a static credential field is attached on provider requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "in", rename_all = "snake_case")]
pub enum KeyPlacement {
	/// Request header, optionally prefixed (e.g. `Token `).
	Header {
		/// Header name.
		name: String,
		/// Prefix prepended to the value.
		prefix: Option<String>,
	},
	/// Query-string parameter.
	Query {
		/// Parameter name.
		name: String,
	},
}

/// Binds one credential field to its placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyBinding {
	/// Payload field supplying the value.
	pub field: String,
	/// Placement on the outgoing request.
	pub placement: KeyPlacement,
}
impl ApiKeyBinding {
	/// Binds `field` to a plain header.
	pub fn header(field: impl Into<String>, name: impl Into<String>) -> Self {
		Self { field: field.into(), placement: KeyPlacement::Header { name: name.into(), prefix: None } }
	}

	/// Binds `field` to a query parameter.
	pub fn query(field: impl Into<String>, name: impl Into<String>) -> Self {
		Self { field: field.into(), placement: KeyPlacement::Query { name: name.into() } }
	}
}

/// Immutable provider configuration consumed by flows.
///
/// Built only through [`ProviderConfig::builder`], whose `build` validates it. Serializable
/// for catalog listings, never deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderConfig {
	/// Provider key.
	pub id: ProviderId,
	/// Human-readable name.
	pub display_name: String,
	/// Authentication scheme.
	pub auth_type: AuthType,
	/// Authorization endpoint (required for OAuth2 and hybrid providers).
	pub authorization_url: Option<Url>,
	/// Token endpoint (required for OAuth2 and hybrid providers).
	pub token_url: Option<Url>,
	/// Scopes requested during authorization, in configuration order.
	pub scopes: Vec<String>,
	/// Credential fields the tenant must supply.
	pub required_fields: Vec<String>,
	/// Named authenticated endpoints.
	pub endpoints: ProbeEndpoints,
	/// Client authentication mode for token requests.
	pub client_auth: ClientAuthMethod,
	/// Placement of static fields on probe requests.
	pub api_key_bindings: Vec<ApiKeyBinding>,
}
impl ProviderConfig {
	/// Creates a new builder for the provided key and scheme.
	pub fn builder(id: ProviderId, auth_type: AuthType) -> ProviderConfigBuilder {
		ProviderConfigBuilder::new(id, auth_type)
	}

	/// Authorization endpoint, or an error when the provider has none.
	pub fn authorization_endpoint(&self) -> Result<&Url, ProviderConfigError> {
		self.authorization_url.as_ref().ok_or(ProviderConfigError::MissingAuthorizationEndpoint {
			provider: self.id.to_string(),
		})
	}

	/// Token endpoint, or an error when the provider has none.
	pub fn token_endpoint(&self) -> Result<&Url, ProviderConfigError> {
		self.token_url
			.as_ref()
			.ok_or(ProviderConfigError::MissingTokenEndpoint { provider: self.id.to_string() })
	}

	/// Joins the configured scopes with a single space.
	pub fn scope_param(&self) -> Option<String> {
		if self.scopes.is_empty() { None } else { Some(self.scopes.join(" ")) }
	}
}
