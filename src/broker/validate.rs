//! Read-only connection check.

// self
use crate::{
	_prelude::*,
	auth::TenantId,
	broker::{ActionReport, Broker, ConnectionState, ResponseData},
	flows::ConnectionTester,
	http::ProviderHttpClient,
};

impl<C> Broker<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Probes the stored credential. Never mutates the store or the channel flag.
	///
	/// A rejected credential is a successful validation reporting `invalid`.
	pub async fn validate(&self, tenant: &TenantId, provider: &str) -> Result<ActionReport> {
		let config = self.lookup(provider)?;
		let current = self
			.store
			.get(tenant, &config.id)
			.await?
			.filter(|record| record.is_active())
			.ok_or_else(|| {
				Error::auth(format!("no active {} connection to validate", config.display_name))
			})?;
		let probe =
			ConnectionTester::new(self.http_client.clone()).probe(config, &current.payload).await;

		if probe.valid {
			return Ok(ActionReport {
				message: format!("{} connection is valid.", config.display_name),
				data: ResponseData::new(config.id.as_ref(), ConnectionState::Connected)
					.with_valid(true)
					.with_profile(probe.profile)
					.with_expires_at(current.expires_at()),
			});
		}

		#[cfg(feature = "tracing")]
		tracing::warn!(
			tenant = %tenant,
			provider = %config.id,
			status = probe.status,
			"Stored credential failed validation."
		);

		Ok(ActionReport {
			message: format!(
				"{} rejected the stored credentials: {}",
				config.display_name,
				probe.error.as_deref().unwrap_or("no reason given")
			),
			data: ResponseData::new(config.id.as_ref(), ConnectionState::Invalid).with_valid(false),
		})
	}
}
