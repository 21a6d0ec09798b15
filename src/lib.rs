//! Multi-tenant marketplace authentication broker: connect tenants to OAuth2 and API-key
//! marketplaces, keep one credential record per tenant and provider, and mirror the connection
//! state onto the tenant-facing channel record.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod broker;
pub mod channel;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
pub mod store;
pub mod tenant;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ProviderId, TenantId},
		broker::Broker,
		channel::{ChannelStatusSync, MemoryChannelDirectory},
		config::BrokerConfig,
		http::ReqwestHttpClient,
		provider::{ApiKeyBinding, AuthType, ProviderConfig, ProviderRegistry},
		store::{CredentialStore, MemoryStore},
		tenant::{StaticTenantResolver, TenantResolver},
	};

	/// Bearer token accepted by the resolver returned from [`build_reqwest_test_broker`].
	pub const TEST_BEARER: &str = "bearer-test-caller";
	/// Tenant resolved for [`TEST_BEARER`].
	pub const TEST_TENANT: &str = "tenant-test";

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient>;

	/// In-memory collaborators backing a test broker.
	#[derive(Clone, Debug)]
	pub struct TestBackends {
		/// Credential records written by the broker.
		pub store: Arc<MemoryStore>,
		/// Channel flags mirrored by the broker.
		pub channels: Arc<MemoryChannelDirectory>,
	}

	/// Returns the tenant identifier resolved for [`TEST_BEARER`].
	pub fn test_tenant() -> TenantId {
		TenantId::new(TEST_TENANT).expect("Test tenant identifier should be valid.")
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.timeout(std::time::Duration::from_secs(5))
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a registry mirroring the built-in marketplaces with every endpoint pointing at
	/// `base_url` (usually an `httpmock` server).
	///
	/// | Provider | Type | Authorize | Token | Profile |
	/// | --- | --- | --- | --- | --- |
	/// | `mercado_livre` | oauth2 | `/ml/authorize` | `/ml/token` | `/ml/users/me` |
	/// | `shopee` | hybrid | `/shopee/authorize` | `/shopee/token` | `/shopee/shop` |
	/// | `magazine_luiza` | api_key | | | `/magalu/sellers/me` |
	/// | `americanas` | api_key (no profile endpoint) | | | |
	pub fn mock_marketplaces(base_url: &str) -> ProviderRegistry {
		let url = |path: &str| {
			Url::parse(&format!("{base_url}{path}")).expect("Mock endpoint URL should parse.")
		};
		let id = |raw: &str| ProviderId::new(raw).expect("Mock provider key should be valid.");
		let configs = [
			ProviderConfig::builder(id("mercado_livre"), AuthType::OAuth2)
				.display_name("Mercado Livre")
				.authorization_url(url("/ml/authorize"))
				.token_url(url("/ml/token"))
				.scopes(["offline_access", "read", "write"])
				.profile_endpoint(url("/ml/users/me"))
				.build(),
			ProviderConfig::builder(id("shopee"), AuthType::Hybrid)
				.display_name("Shopee")
				.authorization_url(url("/shopee/authorize"))
				.token_url(url("/shopee/token"))
				.required_fields(["shop_id"])
				.profile_endpoint(url("/shopee/shop"))
				.bind(ApiKeyBinding::query("shop_id", "shop_id"))
				.build(),
			ProviderConfig::builder(id("magazine_luiza"), AuthType::ApiKey)
				.display_name("Magazine Luiza")
				.required_fields(["api_key", "seller_id"])
				.profile_endpoint(url("/magalu/sellers/me"))
				.bind(ApiKeyBinding::header("api_key", "X-Api-Key"))
				.bind(ApiKeyBinding::header("seller_id", "X-Seller-Id"))
				.build(),
			ProviderConfig::builder(id("americanas"), AuthType::ApiKey)
				.display_name("Americanas Marketplace")
				.required_fields(["user_email", "api_key"])
				.bind(ApiKeyBinding::header("user_email", "X-User-Email"))
				.bind(ApiKeyBinding::header("api_key", "X-Api-Key"))
				.build(),
		];

		configs
			.into_iter()
			.fold(ProviderRegistry::builder(), |builder, config| {
				builder.register(config.expect("Mock provider configuration should validate."))
			})
			.build()
			.expect("Mock registry should build.")
	}

	/// Constructs a [`Broker`] backed by in-memory collaborators and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_broker(registry: ProviderRegistry) -> (ReqwestTestBroker, TestBackends) {
		let store = Arc::new(MemoryStore::default());
		let channels = Arc::new(MemoryChannelDirectory::default());
		let resolver: Arc<dyn TenantResolver> =
			Arc::new(StaticTenantResolver::default().with_caller(TEST_BEARER, test_tenant()));
		let store_dyn: Arc<dyn CredentialStore> = store.clone();
		let channels_dyn: Arc<dyn ChannelStatusSync> = channels.clone();
		let broker = Broker::with_http_client(
			Arc::new(registry),
			store_dyn,
			channels_dyn,
			resolver,
			test_reqwest_http_client(),
		)
		.with_config(BrokerConfig::default());

		(broker, TestBackends { store, channels })
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
