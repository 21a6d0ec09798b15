// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// self
use marketplace_auth_broker::{
	auth::{CredentialPayload, TenantId},
	broker::{AuthenticateRequest, Broker},
	channel::MemoryChannelDirectory,
	error::NetworkError,
	http::{HttpFuture, ProviderHttpClient, ProviderRequest},
	provider::ProviderRegistry,
	store::{CredentialStore, MemoryStore},
	tenant::{CallerIdentity, StaticTenantResolver},
};

/// Transport that never answers in time.
#[derive(Debug, Default)]
struct StalledTransport {
	calls: AtomicUsize,
}
impl ProviderHttpClient for StalledTransport {
	fn execute(&self, _request: ProviderRequest) -> HttpFuture<'_> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async { Err(NetworkError::Timeout) })
	}
}

fn tenant() -> TenantId {
	TenantId::new("tenant-transport").expect("Tenant fixture should be valid.")
}

fn build_broker(transport: Arc<StalledTransport>) -> (Broker<StalledTransport>, Arc<MemoryStore>) {
	let registry = ProviderRegistry::marketplaces().expect("Built-in catalog should validate.");
	let store = Arc::new(MemoryStore::default());
	let broker = Broker::with_http_client(
		Arc::new(registry),
		store.clone(),
		Arc::new(MemoryChannelDirectory::default()),
		Arc::new(StaticTenantResolver::default().with_caller("transport-caller", tenant())),
		transport,
	);

	(broker, store)
}

#[tokio::test]
async fn token_exchange_timeout_surfaces_as_network_error() {
	let transport = Arc::new(StalledTransport::default());
	let (broker, store) = build_broker(transport.clone());
	let request = AuthenticateRequest::new(
		"mercado_livre",
		CredentialPayload::from_fields([("client_id", "c"), ("client_secret", "s")]),
	)
	.with_redirect_uri("https://app/callback")
	.with_code("abc123");
	let envelope = broker.handle(&CallerIdentity::bearer("transport-caller"), request.into()).await;

	assert_eq!(
		envelope.error(),
		Some("Provider endpoint did not answer within the configured timeout.")
	);
	assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
	assert!(store.is_empty());
}

#[tokio::test]
async fn probe_timeout_rejects_the_connection() {
	let transport = Arc::new(StalledTransport::default());
	let (broker, store) = build_broker(transport.clone());
	let request = AuthenticateRequest::new(
		"magazine_luiza",
		CredentialPayload::from_fields([("api_key", "K"), ("seller_id", "S")]),
	);
	let error = broker
		.authenticate(&tenant(), request)
		.await
		.expect_err("A stalled probe should fail the connect.");

	assert!(error.to_string().contains("did not answer within the configured timeout"));
	assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
	assert!(
		store
			.get(&tenant(), &"magazine_luiza".parse().expect("Provider key should parse."))
			.await
			.expect("Store read should succeed.")
			.is_none()
	);
}

#[cfg(feature = "reqwest")]
mod reqwest_transport {
	// std
	use std::time::Duration;
	// crates.io
	use httpmock::prelude::*;
	// self
	use marketplace_auth_broker::{
		config::BrokerConfig,
		error::NetworkError,
		http::{ProviderHttpClient, ProviderRequest, ReqwestHttpClient},
	};

	#[tokio::test]
	async fn configured_timeout_bounds_slow_endpoints() {
		let server = MockServer::start_async().await;
		let slow = server
			.mock_async(|when, then| {
				when.method(GET).path("/slow");
				then.status(200).delay(Duration::from_secs(3)).body("{}");
			})
			.await;
		let config = BrokerConfig { request_timeout_secs: 1, ..Default::default() }
			.validate()
			.expect("One second is an allowed timeout.");
		let client =
			ReqwestHttpClient::from_config(&config).expect("Reqwest client should build.");
		let url = server.url("/slow").parse().expect("Mock URL should parse.");
		let result = client.execute(ProviderRequest::get(url)).await;

		assert!(matches!(result, Err(NetworkError::Timeout)), "Unexpected result: {result:?}");

		slow.assert_async().await;
	}
}
