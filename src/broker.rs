//! Broker facade: resolves the caller's tenant, runs one action, and answers with an envelope.
//!
//! The broker keeps no state between invocations; everything durable lives behind
//! [`CredentialStore`] and [`ChannelStatusSync`]. Each action is implemented in its own module
//! as an `impl Broker` block.

mod authenticate;
mod disconnect;
mod refresh;
mod request;
mod response;
mod validate;

pub use request::*;
pub use response::*;

// self
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};
use crate::{
	_prelude::*,
	auth::{ChannelRef, CredentialStatus, ProviderId, TenantCredential, TenantId},
	channel::ChannelStatusSync,
	config::BrokerConfig,
	error::ValidationError,
	http::ProviderHttpClient,
	obs::{self, ActionOutcome, ActionSpan},
	provider::{ProviderConfig, ProviderRegistry},
	store::{CredentialStore, StoreError},
	tenant::{CallerIdentity, TenantResolver},
};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport.
pub type ReqwestBroker = Broker<ReqwestHttpClient>;

/// Orchestrates provider flows, credential storage, and channel mirroring for every tenant.
pub struct Broker<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Provider catalog consulted for every action.
	pub registry: Arc<ProviderRegistry>,
	/// Credential persistence.
	pub store: Arc<dyn CredentialStore>,
	/// Channel flag mirror.
	pub channels: Arc<dyn ChannelStatusSync>,
	/// Caller-to-tenant resolution.
	pub resolver: Arc<dyn TenantResolver>,
	/// HTTP transport used for token and probe calls.
	pub http_client: Arc<C>,
	/// Runtime tunables.
	pub config: BrokerConfig,
}
impl<C> Broker<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Creates a broker that reuses the caller-provided transport.
	///
	/// The transport is responsible for enforcing [`BrokerConfig::request_timeout`].
	pub fn with_http_client(
		registry: Arc<ProviderRegistry>,
		store: Arc<dyn CredentialStore>,
		channels: Arc<dyn ChannelStatusSync>,
		resolver: Arc<dyn TenantResolver>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			registry,
			store,
			channels,
			resolver,
			http_client: http_client.into(),
			config: BrokerConfig::default(),
		}
	}

	/// Replaces the runtime configuration.
	pub fn with_config(mut self, config: BrokerConfig) -> Self {
		self.config = config;

		self
	}

	/// Resolves the caller's tenant, runs `request`, and wraps the outcome.
	///
	/// Failures never carry request secrets.
	pub async fn handle(&self, caller: &CallerIdentity, request: AuthRequest) -> ResponseEnvelope {
		let secrets = request.secret_values();

		match self.run(caller, request).await {
			Ok(report) => ResponseEnvelope::success(report),
			Err(err) => ResponseEnvelope::failure(&err, &secrets),
		}
	}

	/// Same as [`Broker::handle`] for a raw JSON request envelope.
	///
	/// The caller is resolved before the document is parsed.
	pub async fn handle_json(&self, caller: &CallerIdentity, raw: &str) -> ResponseEnvelope {
		if let Err(err) = self.resolver.resolve(caller).await {
			return ResponseEnvelope::failure(&err, &[]);
		}

		match parse_request(raw) {
			Ok(request) => self.handle(caller, request).await,
			Err(err) => ResponseEnvelope::failure(&err, &[]),
		}
	}

	/// Resolves the caller's tenant and runs `request`.
	pub async fn run(&self, caller: &CallerIdentity, request: AuthRequest) -> Result<ActionReport> {
		let tenant = self.resolver.resolve(caller).await?;

		self.execute(&tenant, request).await
	}

	/// Runs `request` on behalf of an already resolved `tenant`.
	///
	/// Errors come back with the request's secrets redacted. Secrets loaded from the store are
	/// redacted by the action that loaded them.
	pub async fn execute(&self, tenant: &TenantId, request: AuthRequest) -> Result<ActionReport> {
		let kind = request.kind();
		let span = ActionSpan::new(kind, request.provider());
		let secrets = request.secret_values();

		obs::record_action_outcome(kind, ActionOutcome::Attempt);

		let result = span
			.instrument(async move {
				match request {
					AuthRequest::Authenticate(req) => self.authenticate(tenant, req).await,
					AuthRequest::Refresh(req) => self.refresh(tenant, &req.provider).await,
					AuthRequest::Validate(req) => self.validate(tenant, &req.provider).await,
					AuthRequest::Disconnect(req) =>
						self.disconnect(tenant, &req.provider, req.channel_ref).await,
				}
			})
			.await
			.map_err(|err| err.redact(secrets.iter().map(String::as_str)));

		match &result {
			Ok(_) => obs::record_action_outcome(kind, ActionOutcome::Success),
			Err(_err) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(
					tenant = %tenant,
					action = kind.as_str(),
					error = %_err,
					"Broker action failed."
				);

				obs::record_action_outcome(kind, ActionOutcome::Failure);
			},
		}

		result
	}

	fn lookup(&self, provider: &str) -> Result<&ProviderConfig> {
		self.registry.lookup(provider)
	}

	/// Mirrors `connected`, retrying up to [`BrokerConfig::mirror_attempts`] times.
	async fn mirror(
		&self,
		tenant: &TenantId,
		channel: &ChannelRef,
		connected: bool,
	) -> Result<(), StoreError> {
		let attempts = self.config.mirror_attempts.max(1);
		let mut attempt = 1;

		loop {
			match self.channels.set_connected(tenant, channel, connected).await {
				Ok(()) => return Ok(()),
				Err(err) if attempt >= attempts => return Err(err),
				Err(_err) => {
					#[cfg(feature = "tracing")]
					tracing::warn!(
						tenant = %tenant,
						channel = %channel,
						attempt,
						error = %_err,
						"Channel mirror write failed; retrying."
					);

					attempt += 1;
				},
			}
		}
	}

	/// Stores `record`'s pair as it was before a write whose mirror failed.
	///
	/// `previous == None` means the write created the record, which is then marked disconnected
	/// so it never reads as connected.
	async fn roll_back(
		&self,
		tenant: &TenantId,
		provider: &ProviderId,
		previous: Option<TenantCredential>,
	) {
		let result = match previous {
			Some(record) => self.store.restore(record).await,
			None => self
				.store
				.set_status(tenant, provider, CredentialStatus::Disconnected)
				.await
				.map(|_| ()),
		};

		match result {
			Ok(()) => {
				#[cfg(feature = "tracing")]
				tracing::info!(tenant = %tenant, provider = %provider, "Credential write rolled back.");
			},
			Err(_err) => {
				#[cfg(feature = "tracing")]
				tracing::error!(
					tenant = %tenant,
					provider = %provider,
					error = %_err,
					"Credential rollback failed; store and channel may disagree."
				);
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient> {
	/// Creates a broker with its own reqwest transport built from `config`.
	pub fn new(
		registry: Arc<ProviderRegistry>,
		store: Arc<dyn CredentialStore>,
		channels: Arc<dyn ChannelStatusSync>,
		resolver: Arc<dyn TenantResolver>,
		config: BrokerConfig,
	) -> Result<Self, ConfigError> {
		let config = config.validate()?;
		let http_client = ReqwestHttpClient::from_config(&config)?;

		Ok(Self::with_http_client(registry, store, channels, resolver, http_client)
			.with_config(config))
	}
}
impl<C> Clone for Broker<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			registry: self.registry.clone(),
			store: self.store.clone(),
			channels: self.channels.clone(),
			resolver: self.resolver.clone(),
			http_client: self.http_client.clone(),
			config: self.config.clone(),
		}
	}
}
impl<C> Debug for Broker<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("providers", &self.registry.len())
			.field("config", &self.config)
			.finish()
	}
}

/// Channel mirrored when the request names none: the provider's own integration record.
fn channel_or_default(channel: Option<ChannelRef>, provider: &ProviderId) -> Result<ChannelRef> {
	match channel {
		Some(channel) => Ok(channel),
		None => Ok(ChannelRef::new(provider.as_ref())?),
	}
}

fn parse_request(raw: &str) -> Result<AuthRequest> {
	let mut de = serde_json::Deserializer::from_str(raw);

	serde_path_to_error::deserialize(&mut de).map_err(|e| {
		// Parser messages can quote input values, so only the path is echoed.
		let reason = match e.inner().classify() {
			serde_json::error::Category::Data => "has an unexpected value or type",
			_ => "is not valid JSON",
		};

		ValidationError::InvalidField { field: e.path().to_string(), reason: reason.into() }.into()
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn malformed_envelopes_name_the_path_only() {
		let err = parse_request(r#"{"action":"authenticate","provider":"amazon","code":4242}"#)
			.err()
			.expect("Numeric codes should be rejected.");

		assert!(matches!(
			&err,
			Error::Validation(ValidationError::InvalidField { reason, .. })
				if reason == "has an unexpected value or type"
		));
		assert!(!err.to_string().contains("4242"));

		let err = parse_request("{not json").err().expect("Broken JSON should be rejected.");

		assert!(matches!(err, Error::Validation(ValidationError::InvalidField { .. })));
	}

	#[test]
	fn default_channel_is_the_provider_key() {
		let provider = ProviderId::new("shopee").expect("Provider fixture should be valid.");
		let channel = channel_or_default(None, &provider).expect("Provider keys are valid channels.");

		assert_eq!(channel.as_ref(), "shopee");
	}
}
