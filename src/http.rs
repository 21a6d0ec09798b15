//! Transport primitives for provider token and probe calls.
//!
//! The module exposes [`ProviderHttpClient`] alongside crate-owned [`ProviderRequest`] and
//! [`ProviderResponse`] types so downstream crates can plug in custom HTTP stacks without the
//! flows depending on any particular client. Implementations must enforce a bounded timeout
//! and report it as [`NetworkError::Timeout`].

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
#[cfg(feature = "reqwest")] use crate::{config::BrokerConfig, error::ConfigError};
use crate::{_prelude::*, auth::Secret, error::NetworkError};

/// Boxed future returned by [`ProviderHttpClient::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ProviderResponse, NetworkError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of calling provider endpoints.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by
/// every broker invocation, and the futures they return must be `Send`.
pub trait ProviderHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the raw response, whatever its status.
	///
	/// Only transport-level failures (timeouts, DNS, TLS) resolve to an error; non-2xx
	/// responses are returned so flows can classify them.
	fn execute(&self, request: ProviderRequest) -> HttpFuture<'_>;
}

/// HTTP verbs used by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
	/// `GET`, used by probes.
	Get,
	/// `POST`, used by token exchanges.
	Post,
}
impl HttpMethod {
	/// Returns the method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
		}
	}
}

/// Outgoing provider request.
///
/// Header and form values routinely carry secrets, so the `Debug` output lists names only.
#[derive(Clone)]
pub struct ProviderRequest {
	/// Request method.
	pub method: HttpMethod,
	/// Target URL including any query parameters.
	pub url: Url,
	/// Request headers in insertion order.
	pub headers: Vec<(String, String)>,
	/// Form fields sent as `application/x-www-form-urlencoded` when non-empty.
	pub form: Vec<(String, String)>,
}
impl ProviderRequest {
	/// Creates a `GET` request.
	pub fn get(url: Url) -> Self {
		Self { method: HttpMethod::Get, url, headers: Vec::new(), form: Vec::new() }
	}

	/// Creates a form `POST` request.
	pub fn post_form(url: Url) -> Self {
		Self { method: HttpMethod::Post, url, headers: Vec::new(), form: Vec::new() }
	}

	/// Appends a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Appends a form field.
	pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.form.push((name.into(), value.into()));

		self
	}

	/// Appends a query parameter to the URL.
	pub fn query(mut self, name: &str, value: &str) -> Self {
		self.url.query_pairs_mut().append_pair(name, value);

		self
	}

	/// Sets `Authorization: Bearer <token>`.
	pub fn bearer(self, token: &Secret) -> Self {
		self.header("Authorization", format!("Bearer {}", token.expose()))
	}

	/// Sets `Authorization: Basic <base64(user:password)>`.
	pub fn basic_auth(self, user: &str, password: &Secret) -> Self {
		let encoded = STANDARD.encode(format!("{user}:{}", password.expose()));

		self.header("Authorization", format!("Basic {encoded}"))
	}

	/// Returns the first header value matching `name` (case-insensitive).
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Encodes the form fields.
	pub fn encoded_form(&self) -> Option<String> {
		if self.form.is_empty() {
			return None;
		}

		Some(url::form_urlencoded::Serializer::new(String::new()).extend_pairs(&self.form).finish())
	}
}
impl Debug for ProviderRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &self.headers.iter().map(|(name, _)| name).collect::<Vec<_>>())
			.field("form", &self.form.iter().map(|(name, _)| name).collect::<Vec<_>>())
			.finish()
	}
}

/// Raw provider response.
#[derive(Clone, Debug)]
pub struct ProviderResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Response body.
	pub body: Vec<u8>,
}
impl ProviderResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Provider calls should not follow redirects: token endpoints answer directly and a redirected
/// probe would forward credentials to another origin.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`]. The caller is responsible for its timeout.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the timeout and user agent in `config`.
	pub fn from_config(config: &BrokerConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(config.request_timeout())
			.redirect(reqwest::redirect::Policy::none())
			.user_agent(config.user_agent.as_str())
			.build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ProviderHttpClient for ReqwestHttpClient {
	fn execute(&self, request: ProviderRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				HttpMethod::Get => reqwest::Method::GET,
				HttpMethod::Post => reqwest::Method::POST,
			};
			let body = request.encoded_form();
			let mut builder = client.request(method, request.url);

			for (name, value) in request.headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = body {
				builder = builder
					.header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
					.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await?.to_vec();

			Ok(ProviderResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("URL fixture should parse.")
	}

	#[test]
	fn debug_output_hides_header_and_form_values() {
		let request = ProviderRequest::post_form(url("https://example.com/token"))
			.bearer(&Secret::new("access-secret"))
			.form_field("client_secret", "client-secret-value");
		let rendered = format!("{request:?}");

		assert!(rendered.contains("Authorization"));
		assert!(rendered.contains("client_secret"));
		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("client-secret-value"));
	}

	#[test]
	fn basic_auth_and_query_helpers() {
		let request = ProviderRequest::get(url("https://example.com/me"))
			.basic_auth("client", &Secret::new("secret"))
			.query("shop_id", "42");

		assert_eq!(request.header_value("authorization"), Some("Basic Y2xpZW50OnNlY3JldA=="));
		assert_eq!(request.url.as_str(), "https://example.com/me?shop_id=42");
		assert_eq!(request.encoded_form(), None);
	}

	#[test]
	fn form_encoding_escapes_values() {
		let request = ProviderRequest::post_form(url("https://example.com/token"))
			.form_field("redirect_uri", "https://app/callback")
			.form_field("scope", "read write");

		assert_eq!(
			request.encoded_form().as_deref(),
			Some("redirect_uri=https%3A%2F%2Fapp%2Fcallback&scope=read+write")
		);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_accepts_delta_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, "30".parse().expect("Header value fixture should parse."));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(30)));
	}
}
