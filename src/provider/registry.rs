//! Immutable lookup table of provider configurations.

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{ProviderConfig, ProviderConfigError, catalog},
};

/// Read-only catalog of supported providers, built once before the broker runs.
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
	providers: BTreeMap<ProviderId, ProviderConfig>,
}
impl ProviderRegistry {
	/// Starts an empty registry builder.
	pub fn builder() -> ProviderRegistryBuilder {
		ProviderRegistryBuilder::default()
	}

	/// Registry holding the built-in marketplace catalog.
	pub fn marketplaces() -> Result<Self, ProviderConfigError> {
		catalog::marketplaces()?
			.into_iter()
			.fold(Self::builder(), |builder, config| builder.register(config))
			.build()
	}

	/// Resolves a provider key; unknown keys are never treated as an empty configuration.
	pub fn lookup(&self, provider: &str) -> Result<&ProviderConfig> {
		self.providers
			.get(provider)
			.ok_or_else(|| Error::UnsupportedProvider { provider: provider.to_owned() })
	}

	/// Returns `true` if the key is registered.
	pub fn contains(&self, provider: &str) -> bool {
		self.providers.contains_key(provider)
	}

	/// Iterates over every registered configuration in key order.
	pub fn providers(&self) -> impl Iterator<Item = &ProviderConfig> {
		self.providers.values()
	}

	/// Number of registered providers.
	pub fn len(&self) -> usize {
		self.providers.len()
	}

	/// Returns `true` if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.providers.is_empty()
	}
}

/// Collects configurations and rejects duplicate keys.
#[derive(Debug, Default)]
pub struct ProviderRegistryBuilder {
	configs: Vec<ProviderConfig>,
}
impl ProviderRegistryBuilder {
	/// Adds a configuration.
	pub fn register(mut self, config: ProviderConfig) -> Self {
		self.configs.push(config);

		self
	}

	/// Freezes the registry.
	pub fn build(self) -> Result<ProviderRegistry, ProviderConfigError> {
		let mut providers = BTreeMap::new();

		for config in self.configs {
			config.validate()?;

			let key = config.id.clone();

			if providers.insert(key.clone(), config).is_some() {
				return Err(ProviderConfigError::DuplicateProvider { provider: key.to_string() });
			}
		}

		Ok(ProviderRegistry { providers })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::AuthType;

	#[test]
	fn built_in_catalog_covers_every_auth_type() {
		let registry =
			ProviderRegistry::marketplaces().expect("Built-in marketplace catalog should build.");

		assert_eq!(registry.len(), 5);

		for (key, auth_type) in [
			("mercado_livre", AuthType::OAuth2),
			("amazon", AuthType::OAuth2),
			("shopee", AuthType::Hybrid),
			("magazine_luiza", AuthType::ApiKey),
			("americanas", AuthType::ApiKey),
		] {
			let config = registry.lookup(key).expect("Catalog provider should resolve.");

			assert_eq!(config.auth_type, auth_type, "{key} has the wrong auth type.");
		}
	}

	#[test]
	fn unknown_keys_are_unsupported() {
		let registry =
			ProviderRegistry::marketplaces().expect("Built-in marketplace catalog should build.");
		let err = registry.lookup("etsy").expect_err("Unknown providers must not resolve.");

		assert!(matches!(err, Error::UnsupportedProvider { ref provider } if provider == "etsy"));
		assert!(!registry.contains("etsy"));
	}

	#[test]
	fn duplicate_keys_are_rejected() {
		let config = catalog::marketplaces()
			.expect("Built-in marketplace catalog should build.")
			.into_iter()
			.next()
			.expect("Catalog should not be empty.");
		let err = ProviderRegistry::builder()
			.register(config.clone())
			.register(config)
			.build()
			.expect_err("Duplicate providers must be rejected.");

		assert!(matches!(err, ProviderConfigError::DuplicateProvider { .. }));
	}

	#[test]
	fn registry_revalidates_hand_edited_configs() {
		let mut config = catalog::marketplaces()
			.expect("Built-in marketplace catalog should build.")
			.into_iter()
			.find(|config| config.id.as_ref() == "magazine_luiza")
			.expect("Catalog should contain magazine_luiza.");

		config.required_fields.clear();

		let err = ProviderRegistry::builder()
			.register(config)
			.build()
			.expect_err("Configs edited after `build` must be rejected by the registry.");

		assert!(matches!(err, ProviderConfigError::NoRequiredFields { .. }));
	}
}
