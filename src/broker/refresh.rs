//! Access-token rotation with optimistic concurrency.
//!
//! The stored record's `updated_at` is captured before the provider call and used as the
//! compare-and-swap guard, so two concurrent refreshes cannot silently overwrite each other.
//! A refresh token the provider does not rotate is carried over from the stored payload.

// self
use crate::{
	_prelude::*,
	auth::{TenantId, fields},
	broker::{ActionReport, Broker, ConnectionState, ResponseData},
	error::ValidationError,
	flows::OAuth2Flow,
	http::ProviderHttpClient,
	store::{CompareAndSwapOutcome, StoreError},
};

impl<C> Broker<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Rotates the stored access token of `tenant` for `provider`.
	pub async fn refresh(&self, tenant: &TenantId, provider: &str) -> Result<ActionReport> {
		let config = self.lookup(provider)?;

		if !config.auth_type.uses_oauth2() {
			return Err(ValidationError::InvalidField {
				field: "action".into(),
				reason: format!("`{}` uses static API keys and has no token to refresh", config.id),
			}
			.into());
		}

		let current = self
			.store
			.get(tenant, &config.id)
			.await?
			.filter(|record| record.is_active())
			.ok_or_else(|| {
				Error::auth(format!("no active {} connection to refresh", config.display_name))
			})?;
		let refresh_token = current.refresh_token().cloned().ok_or_else(|| {
			Error::auth(format!(
				"no refresh token is stored for {}; authenticate again",
				config.display_name
			))
		})?;
		let (Some(client_id), Some(client_secret)) = (
			current.payload.expose(fields::CLIENT_ID),
			current.payload.non_blank(fields::CLIENT_SECRET),
		) else {
			return Err(Error::auth(format!(
				"stored {} credential lacks client credentials; authenticate again",
				config.display_name
			)));
		};
		let tokens = OAuth2Flow::new(self.http_client.clone())
			.refresh_token(config, client_id, client_secret, &refresh_token)
			.await
			.map_err(|err| err.redact(current.payload.secret_values()))?;
		let mut payload = current.payload.clone();

		tokens.apply_to(&mut payload);

		#[cfg(feature = "tracing")]
		let fingerprint = payload.fingerprint();

		match self.store.compare_and_swap(tenant, &config.id, current.updated_at, payload).await? {
			CompareAndSwapOutcome::Updated => {},
			CompareAndSwapOutcome::Stale | CompareAndSwapOutcome::Missing =>
				return Err(StoreError::Conflict { provider: config.id.to_string() }.into()),
		}

		#[cfg(feature = "tracing")]
		tracing::info!(
			tenant = %tenant,
			provider = %config.id,
			fingerprint = %fingerprint,
			rotated_refresh_token = tokens.refresh_token.is_some(),
			"Access token refreshed."
		);

		Ok(ActionReport {
			message: format!("Access token for {} refreshed.", config.display_name),
			data: ResponseData::new(config.id.as_ref(), ConnectionState::Connected)
				.with_expires_at(tokens.expires_at()),
		})
	}
}
