//! Authenticated probes of a provider's profile endpoint.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPayload, fields},
	flows::oauth2,
	http::{ProviderHttpClient, ProviderRequest},
	provider::{KeyPlacement, ProviderConfig},
};

/// Outcome of a connection probe. Never an error: failures are recorded on the result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbeResult {
	/// `true` when the provider accepted the credentials.
	pub valid: bool,
	/// Parsed profile body, when the endpoint returned JSON.
	pub profile: Option<JsonValue>,
	/// Failure summary, free of credential values.
	pub error: Option<String>,
	/// HTTP status of the probe, when a response was received.
	pub status: Option<u16>,
}
impl ProbeResult {
	fn accepted(profile: Option<JsonValue>, status: Option<u16>) -> Self {
		Self { valid: true, profile, error: None, status }
	}

	fn rejected(error: impl Into<String>, status: Option<u16>) -> Self {
		Self { valid: false, profile: None, error: Some(error.into()), status }
	}
}

/// Checks stored or freshly issued credentials against the provider.
pub struct ConnectionTester<C>
where
	C: ?Sized + ProviderHttpClient,
{
	http_client: Arc<C>,
}
impl<C> ConnectionTester<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Creates a tester sharing `http_client`.
	pub fn new(http_client: Arc<C>) -> Self {
		Self { http_client }
	}

	/// Calls the provider's profile endpoint with `credentials` attached.
	///
	/// OAuth2 and hybrid providers receive `Authorization: Bearer <access_token>`; static fields
	/// are attached through the provider's key bindings. Providers without a profile endpoint
	/// are reported valid without a network call.
	pub async fn probe(&self, config: &ProviderConfig, credentials: &CredentialPayload) -> ProbeResult {
		let Some(endpoint) = config.endpoints.profile.clone() else {
			return ProbeResult::accepted(None, None);
		};
		let mut request = ProviderRequest::get(endpoint).header("Accept", "application/json");

		if config.auth_type.uses_oauth2() {
			let Some(token) = credentials.non_blank(fields::ACCESS_TOKEN) else {
				return ProbeResult::rejected("no access token is stored", None);
			};

			request = request.bearer(token);
		}

		for binding in &config.api_key_bindings {
			let Some(value) = credentials.expose(&binding.field).filter(|v| !v.trim().is_empty())
			else {
				continue;
			};

			request = match &binding.placement {
				KeyPlacement::Header { name, prefix } => request.header(
					name.as_str(),
					format!("{}{value}", prefix.as_deref().unwrap_or_default()),
				),
				KeyPlacement::Query { name } => request.query(name, value),
			};
		}

		match self.http_client.execute(request).await {
			Ok(response) if response.is_success() => {
				let profile = serde_json::from_slice::<JsonValue>(&response.body).ok();

				ProbeResult::accepted(profile, Some(response.status))
			},
			Ok(response) => ProbeResult::rejected(
				oauth2::upstream_error(&response, "credentials were rejected")
					.redact(credentials.secret_values())
					.to_string(),
				Some(response.status),
			),
			Err(err) => {
				let status = err.status();

				ProbeResult::rejected(err.redact(credentials.secret_values()).to_string(), status)
			},
		}
	}
}
impl<C> Debug for ConnectionTester<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ConnectionTester(..)")
	}
}
