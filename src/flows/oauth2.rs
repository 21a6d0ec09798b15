//! OAuth2 authorization-code helpers: authorization URLs, code exchange, and refresh.
//!
//! Token calls are plain `application/x-www-form-urlencoded` POSTs. Responses are parsed through
//! `serde_path_to_error` so malformed bodies report the offending field. `expires_in` may be a
//! number or a numeric string; `token_type` and `refresh_token` are optional.

// crates.io
use serde::{Deserializer, de::Error as _};
// self
use crate::{
	_prelude::*,
	auth::{Secret, TokenSet},
	error::NetworkError,
	http::{ProviderHttpClient, ProviderRequest, ProviderResponse},
	provider::{ClientAuthMethod, ProviderConfig, ProviderConfigError},
};

/// Executes OAuth2 token requests against provider endpoints.
pub struct OAuth2Flow<C>
where
	C: ?Sized + ProviderHttpClient,
{
	http_client: Arc<C>,
}
impl<C> OAuth2Flow<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Creates a flow sharing `http_client`.
	pub fn new(http_client: Arc<C>) -> Self {
		Self { http_client }
	}

	/// Builds the URL the tenant visits to grant access.
	///
	/// Adds `client_id`, `redirect_uri`, `response_type=code`, and `scope` (space-joined, omitted
	/// when the provider declares no scopes). No state or PKCE parameters are added.
	pub fn build_authorization_url(
		config: &ProviderConfig,
		client_id: &str,
		redirect_uri: &Url,
	) -> Result<Url, ProviderConfigError> {
		let mut url = config.authorization_endpoint()?.clone();

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("client_id", client_id);
			pairs.append_pair("redirect_uri", redirect_uri.as_str());
			pairs.append_pair("response_type", "code");

			if let Some(scope) = config.scope_param() {
				pairs.append_pair("scope", &scope);
			}
		}

		Ok(url)
	}

	/// Exchanges an authorization code for tokens (`grant_type=authorization_code`).
	pub async fn exchange_code(
		&self,
		config: &ProviderConfig,
		client_id: &str,
		client_secret: &Secret,
		code: &str,
		redirect_uri: &Url,
	) -> Result<TokenSet> {
		let request = token_request(config, client_id, client_secret)?
			.form_field("grant_type", "authorization_code")
			.form_field("code", code)
			.form_field("redirect_uri", redirect_uri.as_str());

		self.send(request, [client_secret.expose(), code]).await
	}

	/// Exchanges a refresh token for a new access token (`grant_type=refresh_token`).
	///
	/// [`TokenSet::refresh_token`] is `None` when the provider did not rotate it.
	pub async fn refresh_token(
		&self,
		config: &ProviderConfig,
		client_id: &str,
		client_secret: &Secret,
		refresh_token: &Secret,
	) -> Result<TokenSet> {
		let request = token_request(config, client_id, client_secret)?
			.form_field("grant_type", "refresh_token")
			.form_field("refresh_token", refresh_token.expose());

		self.send(request, [client_secret.expose(), refresh_token.expose()]).await
	}

	/// Sends a token request. Provider error text never repeats the `sent` secrets.
	async fn send(&self, request: ProviderRequest, sent: [&str; 2]) -> Result<TokenSet> {
		let response = self.http_client.execute(request).await?;
		let issued_at = OffsetDateTime::now_utc();

		if !response.is_success() {
			return Err(upstream_error(&response, "token request was rejected").redact(sent).into());
		}

		Ok(parse_token_response(&response)?.into_token_set(issued_at))
	}
}
impl<C> Debug for OAuth2Flow<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OAuth2Flow(..)")
	}
}

fn token_request(
	config: &ProviderConfig,
	client_id: &str,
	client_secret: &Secret,
) -> Result<ProviderRequest> {
	let request =
		ProviderRequest::post_form(config.token_endpoint()?.clone()).header("Accept", "application/json");
	let request = match config.client_auth {
		ClientAuthMethod::ClientSecretPost => request
			.form_field("client_id", client_id)
			.form_field("client_secret", client_secret.expose()),
		ClientAuthMethod::ClientSecretBasic => request.basic_auth(client_id, client_secret),
	};

	Ok(request)
}

/// Builds a [`NetworkError::Upstream`] from a non-2xx response.
///
/// OAuth `error`/`error_description` fields are surfaced when the body carries them; other body
/// content is dropped.
pub(crate) fn upstream_error(response: &ProviderResponse, fallback: &str) -> NetworkError {
	#[derive(Deserialize)]
	struct ErrorBody {
		error: Option<String>,
		error_description: Option<String>,
		message: Option<String>,
	}

	let body = serde_json::from_slice::<ErrorBody>(&response.body).ok();
	let message = match body {
		Some(ErrorBody { error: Some(code), error_description: Some(description), .. }) =>
			format!("{code}: {description}"),
		Some(ErrorBody { error: Some(code), .. }) => code,
		Some(ErrorBody { message: Some(message), .. }) => message,
		_ => fallback.to_owned(),
	};

	NetworkError::Upstream { status: response.status, message, retry_after: response.retry_after }
}

fn parse_token_response(response: &ProviderResponse) -> Result<TokenResponse, NetworkError> {
	let mut de = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| NetworkError::MalformedResponse { source, status: Some(response.status) })
}

#[derive(Deserialize)]
struct TokenResponse {
	#[serde(deserialize_with = "non_blank")]
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default, deserialize_with = "lenient_seconds")]
	expires_in: Option<i64>,
	#[serde(default)]
	token_type: Option<String>,
	#[serde(default)]
	scope: Option<String>,
}
impl TokenResponse {
	fn into_token_set(self, issued_at: OffsetDateTime) -> TokenSet {
		TokenSet {
			access_token: Secret::new(self.access_token),
			refresh_token: self.refresh_token.filter(|token| !token.trim().is_empty()).map(Secret::new),
			expires_in: self.expires_in.filter(|secs| *secs > 0).map(Duration::seconds),
			token_type: self.token_type,
			scope: self.scope,
			issued_at,
		}
	}
}

fn non_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	let value = String::deserialize(deserializer)?;

	if value.trim().is_empty() {
		return Err(D::Error::custom("value must not be blank"));
	}

	Ok(value)
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	// Ten years. Anything longer is a broken provider, and the expiry math must not overflow.
	const MAX_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Seconds {
		Number(i64),
		Text(String),
	}

	let secs = match Option::<Seconds>::deserialize(deserializer)? {
		None => return Ok(None),
		Some(Seconds::Number(secs)) => secs,
		Some(Seconds::Text(raw)) => raw
			.trim()
			.parse()
			.map_err(|_| D::Error::custom(format!("`{raw}` is not a number of seconds")))?,
	};

	if secs > MAX_LIFETIME_SECS {
		return Err(D::Error::custom(format!(
			"{secs} seconds exceeds the supported token lifetime of {MAX_LIFETIME_SECS}"
		)));
	}

	Ok(Some(secs))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16, body: &str) -> ProviderResponse {
		ProviderResponse { status, retry_after: None, body: body.as_bytes().to_vec() }
	}

	#[test]
	fn token_response_accepts_string_lifetimes_and_missing_fields() {
		let parsed = parse_token_response(&response(
			200,
			r#"{"access_token":"t1","expires_in":"3600"}"#,
		))
		.expect("String lifetimes should parse.");
		let set = parsed.into_token_set(OffsetDateTime::UNIX_EPOCH);

		assert_eq!(set.access_token.expose(), "t1");
		assert_eq!(set.expires_in, Some(Duration::hours(1)));
		assert!(set.refresh_token.is_none());
		assert!(set.token_type.is_none());
	}

	#[test]
	fn token_response_errors_name_the_field() {
		let err = parse_token_response(&response(200, r#"{"access_token":"","expires_in":60}"#))
			.err()
			.expect("Blank access tokens should be rejected.");

		match err {
			NetworkError::MalformedResponse { source, status } => {
				assert_eq!(source.path().to_string(), "access_token");
				assert_eq!(status, Some(200));
			},
			other => panic!("Unexpected error: {other:?}"),
		}

		let err = parse_token_response(&response(200, r#"{"access_token":"t","expires_in":"soon"}"#))
			.err()
			.expect("Non-numeric lifetimes should be rejected.");

		assert!(matches!(err, NetworkError::MalformedResponse { ref source, .. } if source.path().to_string() == "expires_in"));
	}

	#[test]
	fn token_response_rejects_unbounded_lifetimes() {
		for body in [
			r#"{"access_token":"t1","expires_in":9223372036854775807}"#,
			r#"{"access_token":"t1","expires_in":"315360001"}"#,
		] {
			let err = parse_token_response(&response(200, body))
				.err()
				.expect("Lifetimes beyond ten years should be rejected.");

			assert!(
				matches!(err, NetworkError::MalformedResponse { ref source, .. } if source.path().to_string() == "expires_in"),
				"Unexpected error for {body}: {err:?}"
			);
		}

		let set = parse_token_response(&response(200, r#"{"access_token":"t1","expires_in":315360000}"#))
			.expect("A ten year lifetime is still accepted.")
			.into_token_set(OffsetDateTime::UNIX_EPOCH);

		assert!(set.expires_at().is_some());
	}

	#[test]
	fn upstream_error_prefers_oauth_fields() {
		let err = upstream_error(
			&response(400, r#"{"error":"invalid_grant","error_description":"code expired"}"#),
			"fallback",
		);

		assert_eq!(err.to_string(), "Provider endpoint returned HTTP 400: invalid_grant: code expired.");

		let err = upstream_error(&response(502, "<html>bad gateway</html>"), "fallback");

		assert!(matches!(err, NetworkError::Upstream { status: 502, ref message, .. } if message == "fallback"));
	}
}
