//! Connects a tenant to a provider.
//!
//! OAuth2 and hybrid providers go through two calls: the first (no `code`) returns the
//! authorization URL, the second exchanges the code. API-key providers connect in one call.
//! In every case the credential is probed before anything is written.

// self
use crate::{
	_prelude::*,
	auth::{ChannelRef, CredentialPayload, CredentialStatus, TenantCredential, TenantId, fields},
	broker::{ActionReport, AuthenticateRequest, Broker, ConnectionState, ResponseData},
	error::ValidationError,
	flows::{self, ConnectionTester, OAuth2Flow},
	http::ProviderHttpClient,
	provider::ProviderConfig,
};

impl<C> Broker<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Connects `tenant` to the provider named in `request`.
	pub async fn authenticate(
		&self,
		tenant: &TenantId,
		request: AuthenticateRequest,
	) -> Result<ActionReport> {
		let config = self.lookup(&request.provider)?;
		let channel = super::channel_or_default(request.channel_ref.clone(), &config.id)?;

		if !config.auth_type.uses_oauth2() {
			flows::validate_fields(config, &request.credentials)?;

			let payload = retain_fields(&request.credentials, &config.required_fields);

			return self.connect(tenant, config, &channel, payload).await;
		}

		let redirect_uri = parse_redirect_uri(config, request.redirect_uri.as_deref())?;
		let code = request.code.as_ref().filter(|code| !code.is_blank());
		let Some(code) = code else {
			flows::require_fields(config, &request.credentials, [fields::CLIENT_ID])?;

			let client_id = request.credentials.expose(fields::CLIENT_ID).unwrap_or_default();
			let url = OAuth2Flow::<C>::build_authorization_url(config, client_id, &redirect_uri)?;

			return Ok(ActionReport {
				message: format!("Visit the authorization URL to connect {}.", config.display_name),
				data: ResponseData::new(config.id.as_ref(), ConnectionState::AuthorizationRequired)
					.with_authorization_url(url),
			});
		};

		flows::validate_fields(config, &request.credentials)?;

		let mut payload = retain_fields(&request.credentials, &config.required_fields);
		let client_id = payload.expose(fields::CLIENT_ID).unwrap_or_default().to_owned();
		let client_secret = payload.non_blank(fields::CLIENT_SECRET).cloned().ok_or_else(|| {
			ValidationError::MissingFields {
				provider: config.id.to_string(),
				fields: vec![fields::CLIENT_SECRET.into()],
			}
		})?;
		let tokens = OAuth2Flow::new(self.http_client.clone())
			.exchange_code(config, &client_id, &client_secret, code.expose(), &redirect_uri)
			.await?;

		tokens.apply_to(&mut payload);

		self.connect(tenant, config, &channel, payload).await
	}

	/// Probes `payload`, stores it as active, and mirrors the channel as connected.
	async fn connect(
		&self,
		tenant: &TenantId,
		config: &ProviderConfig,
		channel: &ChannelRef,
		payload: CredentialPayload,
	) -> Result<ActionReport> {
		let probe = ConnectionTester::new(self.http_client.clone()).probe(config, &payload).await;

		if !probe.valid {
			return Err(Error::auth(format!(
				"{} rejected the credentials: {}",
				config.display_name,
				probe.error.as_deref().unwrap_or("no reason given")
			)));
		}

		let stored = self.store_connected(tenant, config, channel, payload).await?;

		#[cfg(feature = "tracing")]
		tracing::info!(
			tenant = %tenant,
			provider = %config.id,
			channel = %channel,
			fingerprint = %stored.payload.fingerprint(),
			"Credential connected."
		);

		Ok(ActionReport {
			message: format!("Connected to {}.", config.display_name),
			data: ResponseData::new(config.id.as_ref(), ConnectionState::Connected)
				.with_profile(probe.profile)
				.with_expires_at(stored.expires_at()),
		})
	}

	/// Upserts the active credential and mirrors the channel, rolling back on mirror failure.
	async fn store_connected(
		&self,
		tenant: &TenantId,
		config: &ProviderConfig,
		channel: &ChannelRef,
		payload: CredentialPayload,
	) -> Result<TenantCredential> {
		let previous = self.store.get(tenant, &config.id).await?;
		let stored =
			self.store.upsert(tenant, &config.id, payload, CredentialStatus::Active).await?;

		if let Err(err) = self.mirror(tenant, channel, true).await {
			self.roll_back(tenant, &config.id, previous).await;

			return Err(err.into());
		}

		Ok(stored)
	}
}

fn parse_redirect_uri(config: &ProviderConfig, raw: Option<&str>) -> Result<Url> {
	let raw = raw
		.map(str::trim)
		.filter(|raw| !raw.is_empty())
		.ok_or_else(|| ValidationError::MissingRedirectUri { provider: config.id.to_string() })?;

	Url::parse(raw).map_err(|e| {
		ValidationError::InvalidField { field: "redirect_uri".into(), reason: e.to_string() }.into()
	})
}

/// Keeps only the fields the provider declares, dropping anything else the caller sent.
fn retain_fields(credentials: &CredentialPayload, names: &[String]) -> CredentialPayload {
	CredentialPayload::from_fields(
		names
			.iter()
			.filter_map(|name| credentials.get(name).map(|value| (name.clone(), value.clone()))),
	)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn retain_fields_drops_undeclared_values() {
		let credentials =
			CredentialPayload::from_fields([("api_key", "K"), ("seller_id", "S"), ("extra", "X")]);
		let kept = retain_fields(&credentials, &["api_key".into(), "seller_id".into()]);

		assert_eq!(kept.field_names().collect::<Vec<_>>(), ["api_key", "seller_id"]);
	}

	#[test]
	fn redirect_uri_is_required_and_parsed() {
		let config = crate::provider::ProviderRegistry::marketplaces()
			.expect("Built-in catalog should validate.")
			.lookup("amazon")
			.expect("Catalog should contain amazon.")
			.clone();

		assert!(matches!(
			parse_redirect_uri(&config, Some("  ")),
			Err(Error::Validation(ValidationError::MissingRedirectUri { .. }))
		));
		assert!(matches!(
			parse_redirect_uri(&config, Some("not a url")),
			Err(Error::Validation(ValidationError::InvalidField { .. }))
		));
		assert_eq!(
			parse_redirect_uri(&config, Some("https://app/callback"))
				.expect("Absolute URLs should parse.")
				.as_str(),
			"https://app/callback"
		);
	}
}
