//! Broker-level error types shared across flows, providers, and stores.

// self
use crate::{_prelude::*, auth};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// Display strings are surfaced verbatim in failure envelopes, so no variant ever formats a
/// credential value.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller supplied missing or malformed fields.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Provider key is not present in the registry.
	#[error("Provider `{provider}` is not supported.")]
	UnsupportedProvider {
		/// Provider key supplied by the caller.
		provider: String,
	},
	/// Caller identity is missing or invalid.
	#[error("Caller is not authenticated: {reason}.")]
	Unauthenticated {
		/// Resolver-supplied reason string.
		reason: String,
	},
	/// Caller is authenticated but no active tenant could be established.
	#[error("Tenant could not be resolved: {reason}.")]
	TenantResolution {
		/// Resolver-supplied reason string.
		reason: String,
	},
	/// Provider rejected the credentials, or the stored credential cannot be used.
	#[error("Authentication failed: {reason}.")]
	Auth {
		/// Provider- or broker-supplied reason string.
		reason: String,
	},
	/// Upstream non-2xx response or transport failure.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// Storage-layer or channel-mirror failure.
	#[error("{0}")]
	Persistence(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Shorthand for [`Error::Auth`].
	pub fn auth(reason: impl Into<String>) -> Self {
		Self::Auth { reason: reason.into() }
	}

	/// Returns `true` when the caller can fix the failure by changing the request.
	pub fn is_caller_fixable(&self) -> bool {
		matches!(
			self,
			Self::Validation(_)
				| Self::UnsupportedProvider { .. }
				| Self::Unauthenticated { .. }
				| Self::TenantResolution { .. }
				| Self::Auth { .. }
		)
	}

	/// Upstream HTTP status attached to network failures, if any.
	pub fn upstream_status(&self) -> Option<u16> {
		match self {
			Self::Network(err) => err.status(),
			_ => None,
		}
	}

	/// Replaces `secrets` in the variants that carry provider-supplied text.
	pub fn redact<'a>(self, secrets: impl IntoIterator<Item = &'a str>) -> Self {
		match self {
			Self::Auth { reason } => Self::Auth { reason: auth::redact(reason, secrets) },
			Self::Network(err) => Self::Network(err.redact(secrets)),
			other => other,
		}
	}
}
impl From<crate::provider::ProviderConfigError> for Error {
	fn from(e: crate::provider::ProviderConfigError) -> Self {
		Self::Config(e.into())
	}
}
impl From<crate::auth::IdentifierError> for Error {
	fn from(e: crate::auth::IdentifierError) -> Self {
		Self::Validation(e.into())
	}
}

/// Request-shape failures detected before contacting a provider.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Required credential fields are absent or blank.
	#[error("Provider `{provider}` requires the following credential fields: {}.", fields.join(", "))]
	MissingFields {
		/// Provider key the fields belong to.
		provider: String,
		/// Names of the missing fields, in configuration order.
		fields: Vec<String>,
	},
	/// OAuth2 flows need a redirect URI.
	#[error("A redirect_uri is required to authenticate with `{provider}`.")]
	MissingRedirectUri {
		/// Provider key requiring the redirect.
		provider: String,
	},
	/// A field holds an unusable value.
	#[error("Field `{field}` is invalid: {reason}.")]
	InvalidField {
		/// Offending field name.
		field: String,
		/// Human-readable reason.
		reason: String,
	},
	/// Identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
}

/// Configuration and construction failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Provider configuration failed validation.
	#[error(transparent)]
	Provider(#[from] crate::provider::ProviderConfigError),
	/// Broker configuration document could not be parsed.
	#[error("Broker configuration is malformed at `{path}`: {message}.")]
	Malformed {
		/// JSON path of the offending value.
		path: String,
		/// Parser message.
		message: String,
	},
	/// A configuration value is outside its supported range.
	#[error("Configuration value `{key}` is invalid: {reason}.")]
	InvalidValue {
		/// Configuration key.
		key: &'static str,
		/// Human-readable reason.
		reason: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Upstream and transport failures observed while calling provider endpoints.
#[derive(Debug, ThisError)]
pub enum NetworkError {
	/// Provider answered with a non-2xx status.
	#[error("Provider endpoint returned HTTP {status}: {message}.")]
	Upstream {
		/// HTTP status code returned by the provider.
		status: u16,
		/// Provider- or broker-supplied message summarizing the failure.
		message: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Request exceeded the configured timeout.
	#[error("Provider endpoint did not answer within the configured timeout.")]
	Timeout,
	/// Provider responded with a body that could not be parsed.
	#[error("Provider endpoint returned a malformed response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: Option<u16>,
	},
	/// Underlying HTTP client reported a network failure (DNS, TCP, TLS).
	#[error("Network error occurred while calling the provider endpoint.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl NetworkError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Replaces `secrets` in the upstream message. Other variants never format provider text.
	pub fn redact<'a>(self, secrets: impl IntoIterator<Item = &'a str>) -> Self {
		match self {
			Self::Upstream { status, message, retry_after } =>
				Self::Upstream { status, message: auth::redact(message, secrets), retry_after },
			other => other,
		}
	}

	/// Upstream HTTP status, when the failure carries one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Upstream { status, .. } => Some(*status),
			Self::MalformedResponse { status, .. } => *status,
			Self::Timeout | Self::Transport { .. } => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for NetworkError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::transport(e) }
	}
}
