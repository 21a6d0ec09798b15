//! Starts a Mercado Livre connection for a tenant and prints the JSON envelope a caller would
//! receive, including the authorization URL the seller must visit.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
// self
use marketplace_auth_broker::{
	auth::{CredentialPayload, TenantId},
	broker::{AuthRequest, AuthenticateRequest, Broker},
	channel::MemoryChannelDirectory,
	config::BrokerConfig,
	provider::ProviderRegistry,
	store::MemoryStore,
	tenant::{CallerIdentity, StaticTenantResolver},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let resolver =
		StaticTenantResolver::default().with_caller("demo-session", TenantId::new("tenant-acme")?);
	let broker = Broker::new(
		Arc::new(ProviderRegistry::marketplaces()?),
		Arc::new(MemoryStore::default()),
		Arc::new(MemoryChannelDirectory::default()),
		Arc::new(resolver),
		BrokerConfig::from_env()?,
	)?;
	let caller = CallerIdentity::bearer("demo-session");
	let request = AuthenticateRequest::new(
		"mercado_livre",
		CredentialPayload::from_fields([("client_id", "demo-client"), ("client_secret", "demo-secret")]),
	)
	.with_redirect_uri("https://app.example.com/integrations/callback");
	let envelope = broker.handle(&caller, request.into()).await;

	println!("{}", serde_json::to_string_pretty(&envelope)?);

	// Without a stored credential there is nothing to validate.
	let envelope = broker.handle(&caller, AuthRequest::validate("mercado_livre")).await;

	println!("{}", serde_json::to_string_pretty(&envelope)?);

	Ok(())
}
