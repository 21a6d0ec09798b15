//! Soft disconnection. Records are kept with `disconnected` status, never deleted.

// self
use crate::{
	_prelude::*,
	auth::{ChannelRef, CredentialStatus, TenantId},
	broker::{ActionReport, Broker, ConnectionState, ResponseData},
	http::ProviderHttpClient,
};

impl<C> Broker<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Marks the credential disconnected and mirrors the channel as disconnected.
	///
	/// Idempotent: repeating the call, or calling it with no stored credential, succeeds with the
	/// same end state.
	pub async fn disconnect(
		&self,
		tenant: &TenantId,
		provider: &str,
		channel: Option<ChannelRef>,
	) -> Result<ActionReport> {
		let config = self.lookup(provider)?;
		let channel = super::channel_or_default(channel, &config.id)?;
		let previous = self.store.get(tenant, &config.id).await?;

		if previous.is_some() {
			self.store.set_status(tenant, &config.id, CredentialStatus::Disconnected).await?;
		}
		if let Err(err) = self.mirror(tenant, &channel, false).await {
			if let Some(previous) = previous {
				self.roll_back(tenant, &config.id, Some(previous)).await;
			}

			return Err(err.into());
		}

		#[cfg(feature = "tracing")]
		tracing::info!(tenant = %tenant, provider = %config.id, channel = %channel, "Credential disconnected.");

		Ok(ActionReport {
			message: format!("Disconnected from {}.", config.display_name),
			data: ResponseData::new(config.id.as_ref(), ConnectionState::Disconnected),
		})
	}
}
