//! Validating builder for [`ProviderConfig`](crate::provider::ProviderConfig).

// std
use std::{collections::BTreeSet, iter::IntoIterator};
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{ProviderId, fields},
	provider::{
		ApiKeyBinding, AuthType, ClientAuthMethod, ProbeEndpoints, ProviderConfig,
	},
};

/// Errors raised while constructing or validating provider configurations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderConfigError {
	/// OAuth2 and hybrid providers need an authorization endpoint.
	#[error("Provider `{provider}` is missing its authorization endpoint.")]
	MissingAuthorizationEndpoint {
		/// Provider key.
		provider: String,
	},
	/// OAuth2 and hybrid providers need a token endpoint.
	#[error("Provider `{provider}` is missing its token endpoint.")]
	MissingTokenEndpoint {
		/// Provider key.
		provider: String,
	},
	/// Endpoints must use HTTPS unless they target a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A URL literal could not be parsed.
	#[error("Endpoint URL `{url}` is invalid: {reason}.")]
	InvalidUrl {
		/// Raw URL.
		url: String,
		/// Parser message.
		reason: String,
	},
	/// Providers must name at least one required credential field.
	#[error("Provider `{provider}` declares no required credential fields.")]
	NoRequiredFields {
		/// Provider key.
		provider: String,
	},
	/// OAuth2 providers must require the client credential fields.
	#[error("Provider `{provider}` must require the `{field}` field.")]
	MissingClientField {
		/// Provider key.
		provider: String,
		/// Missing field name.
		field: &'static str,
	},
	/// A key binding references a field that is not required.
	#[error("Provider `{provider}` binds `{field}`, which is not a required field.")]
	UnboundField {
		/// Provider key.
		provider: String,
		/// Field referenced by the binding.
		field: String,
	},
	/// API-key providers with a profile endpoint need at least one binding to probe it.
	#[error("Provider `{provider}` has a profile endpoint but no key bindings.")]
	MissingKeyBindings {
		/// Provider key.
		provider: String,
	},
	/// Provider key failed identifier validation.
	#[error("Provider key `{key}` is invalid: {reason}.")]
	InvalidKey {
		/// Rejected key.
		key: String,
		/// Validation message.
		reason: String,
	},
	/// Two configurations share a key.
	#[error("Provider `{provider}` is registered more than once.")]
	DuplicateProvider {
		/// Provider key.
		provider: String,
	},
}

/// Builder for [`ProviderConfig`] values.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
	id: ProviderId,
	auth_type: AuthType,
	display_name: Option<String>,
	authorization_url: Option<Url>,
	token_url: Option<Url>,
	scopes: Vec<String>,
	required_fields: Vec<String>,
	endpoints: ProbeEndpoints,
	client_auth: ClientAuthMethod,
	api_key_bindings: Vec<ApiKeyBinding>,
}
impl ProviderConfigBuilder {
	/// Creates a new builder seeded with the provided key and scheme.
	///
	/// OAuth2 and hybrid builders start with `client_id` and `client_secret` as required fields.
	pub fn new(id: ProviderId, auth_type: AuthType) -> Self {
		let required_fields = if auth_type.uses_oauth2() {
			vec![fields::CLIENT_ID.to_owned(), fields::CLIENT_SECRET.to_owned()]
		} else {
			Vec::new()
		};

		Self {
			id,
			auth_type,
			display_name: None,
			authorization_url: None,
			token_url: None,
			scopes: Vec::new(),
			required_fields,
			endpoints: ProbeEndpoints::default(),
			client_auth: ClientAuthMethod::default(),
			api_key_bindings: Vec::new(),
		}
	}

	/// Sets the display name (defaults to the provider key).
	pub fn display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());

		self
	}

	/// Sets the authorization endpoint.
	pub fn authorization_url(mut self, url: Url) -> Self {
		self.authorization_url = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Appends requested scopes, keeping order and dropping duplicates.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for scope in scopes.into_iter().map(Into::into) {
			if !self.scopes.contains(&scope) {
				self.scopes.push(scope);
			}
		}

		self
	}

	/// Appends required credential fields, keeping order and dropping duplicates.
	pub fn required_fields<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for name in names.into_iter().map(Into::into) {
			if !self.required_fields.contains(&name) {
				self.required_fields.push(name);
			}
		}

		self
	}

	/// Sets the profile endpoint used by connection probes.
	pub fn profile_endpoint(mut self, url: Url) -> Self {
		self.endpoints.profile = Some(url);

		self
	}

	/// Replaces the full endpoint set.
	pub fn endpoints(mut self, endpoints: ProbeEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth = method;

		self
	}

	/// Adds a key binding.
	pub fn bind(mut self, binding: ApiKeyBinding) -> Self {
		self.api_key_bindings.push(binding);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfig, ProviderConfigError> {
		let display_name = self.display_name.unwrap_or_else(|| self.id.to_string());
		let config = ProviderConfig {
			id: self.id,
			display_name,
			auth_type: self.auth_type,
			authorization_url: self.authorization_url,
			token_url: self.token_url,
			scopes: self.scopes,
			required_fields: self.required_fields,
			endpoints: self.endpoints,
			client_auth: self.client_auth,
			api_key_bindings: self.api_key_bindings,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ProviderConfig {
	/// Validates invariants for the configuration.
	pub(crate) fn validate(&self) -> Result<(), ProviderConfigError> {
		let provider = || self.id.to_string();

		if self.required_fields.is_empty() {
			return Err(ProviderConfigError::NoRequiredFields { provider: provider() });
		}
		if self.auth_type.uses_oauth2() {
			validate_endpoint("authorization", self.authorization_endpoint()?)?;
			validate_endpoint("token", self.token_endpoint()?)?;

			for field in [fields::CLIENT_ID, fields::CLIENT_SECRET] {
				if !self.required_fields.iter().any(|name| name == field) {
					return Err(ProviderConfigError::MissingClientField {
						provider: provider(),
						field,
					});
				}
			}
		} else if let Some(url) = self.authorization_url.as_ref() {
			validate_endpoint("authorization", url)?;
		}

		for (name, url) in [
			("profile", &self.endpoints.profile),
			("orders", &self.endpoints.orders),
			("products", &self.endpoints.products),
			("inventory", &self.endpoints.inventory),
		] {
			if let Some(url) = url {
				validate_endpoint(name, url)?;
			}
		}

		let required: BTreeSet<&str> = self.required_fields.iter().map(String::as_str).collect();

		if let Some(binding) =
			self.api_key_bindings.iter().find(|binding| !required.contains(binding.field.as_str()))
		{
			return Err(ProviderConfigError::UnboundField {
				provider: provider(),
				field: binding.field.clone(),
			});
		}
		if matches!(self.auth_type, AuthType::ApiKey)
			&& self.endpoints.profile.is_some()
			&& self.api_key_bindings.is_empty()
		{
			return Err(ProviderConfigError::MissingKeyBindings { provider: provider() });
		}

		Ok(())
	}
}

/// Parses a URL literal into a configuration error on failure.
pub fn parse_endpoint(raw: &str) -> Result<Url, ProviderConfigError> {
	Url::parse(raw).map_err(|e| ProviderConfigError::InvalidUrl {
		url: raw.to_owned(),
		reason: e.to_string(),
	})
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderConfigError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(ProviderConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn id(value: &str) -> ProviderId {
		ProviderId::new(value).expect("Provider fixture should be valid.")
	}

	fn url(raw: &str) -> Url {
		parse_endpoint(raw).expect("URL fixture should parse.")
	}

	#[test]
	fn loopback_http_is_allowed_but_remote_http_is_not() {
		assert!(validate_endpoint("token", &url("http://127.0.0.1:8080/token")).is_ok());
		assert!(validate_endpoint("token", &url("http://localhost/token")).is_ok());
		assert!(matches!(
			validate_endpoint("token", &url("http://example.com/token")),
			Err(ProviderConfigError::InsecureEndpoint { endpoint: "token", .. })
		));
	}

	#[test]
	fn oauth_builder_seeds_client_fields_and_dedupes() {
		let config = ProviderConfig::builder(id("demo"), AuthType::OAuth2)
			.authorization_url(url("https://example.com/auth"))
			.token_url(url("https://example.com/token"))
			.required_fields(["client_id", "shop_id"])
			.scopes(["read", "write", "read"])
			.build()
			.expect("OAuth2 configuration should build.");

		assert_eq!(config.required_fields, ["client_id", "client_secret", "shop_id"]);
		assert_eq!(config.scopes, ["read", "write"]);
		assert_eq!(config.display_name, "demo");
		assert_eq!(config.scope_param().as_deref(), Some("read write"));
	}

	#[test]
	fn api_key_bindings_must_reference_required_fields() {
		let err = ProviderConfig::builder(id("keys"), AuthType::ApiKey)
			.required_fields(["api_key"])
			.bind(ApiKeyBinding::header("token", "X-Token"))
			.build()
			.expect_err("Bindings must reference required fields.");

		assert!(matches!(err, ProviderConfigError::UnboundField { .. }));
	}
}
