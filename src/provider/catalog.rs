//! Built-in marketplace configurations.

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{
		ApiKeyBinding, AuthType, ProbeEndpoints, ProviderConfig, ProviderConfigError,
		parse_endpoint,
	},
};

/// Returns the configurations for every marketplace supported out of the box.
pub fn marketplaces() -> Result<Vec<ProviderConfig>, ProviderConfigError> {
	Ok(vec![mercado_livre()?, amazon()?, shopee()?, magazine_luiza()?, americanas()?])
}

fn key(raw: &str) -> Result<ProviderId, ProviderConfigError> {
	ProviderId::new(raw)
		.map_err(|e| ProviderConfigError::InvalidKey { key: raw.to_owned(), reason: e.to_string() })
}

fn endpoints(
	profile: &str,
	orders: Option<&str>,
	products: Option<&str>,
	inventory: Option<&str>,
) -> Result<ProbeEndpoints, ProviderConfigError> {
	Ok(ProbeEndpoints {
		profile: Some(parse_endpoint(profile)?),
		orders: orders.map(parse_endpoint).transpose()?,
		products: products.map(parse_endpoint).transpose()?,
		inventory: inventory.map(parse_endpoint).transpose()?,
	})
}

fn mercado_livre() -> Result<ProviderConfig, ProviderConfigError> {
	ProviderConfig::builder(key("mercado_livre")?, AuthType::OAuth2)
		.display_name("Mercado Livre")
		.authorization_url(parse_endpoint("https://auth.mercadolivre.com.br/authorization")?)
		.token_url(parse_endpoint("https://api.mercadolibre.com/oauth/token")?)
		.scopes(["offline_access", "read", "write"])
		.endpoints(endpoints(
			"https://api.mercadolibre.com/users/me",
			Some("https://api.mercadolibre.com/orders/search"),
			Some("https://api.mercadolibre.com/users/me/items/search"),
			None,
		)?)
		.build()
}

fn amazon() -> Result<ProviderConfig, ProviderConfigError> {
	ProviderConfig::builder(key("amazon")?, AuthType::OAuth2)
		.display_name("Amazon Seller Central")
		.authorization_url(parse_endpoint(
			"https://sellercentral.amazon.com.br/apps/authorize/consent",
		)?)
		.token_url(parse_endpoint("https://api.amazon.com/auth/o2/token")?)
		.scopes(["profile"])
		.endpoints(endpoints(
			"https://sellingpartnerapi-na.amazon.com/sellers/v1/marketplaceParticipations",
			Some("https://sellingpartnerapi-na.amazon.com/orders/v0/orders"),
			Some("https://sellingpartnerapi-na.amazon.com/catalog/2022-04-01/items"),
			Some("https://sellingpartnerapi-na.amazon.com/fba/inventory/v1/summaries"),
		)?)
		.build()
}

fn shopee() -> Result<ProviderConfig, ProviderConfigError> {
	ProviderConfig::builder(key("shopee")?, AuthType::Hybrid)
		.display_name("Shopee")
		.authorization_url(parse_endpoint(
			"https://partner.shopeemobile.com/api/v2/shop/auth_partner",
		)?)
		.token_url(parse_endpoint("https://partner.shopeemobile.com/api/v2/auth/token/get")?)
		.required_fields(["shop_id"])
		.endpoints(endpoints(
			"https://partner.shopeemobile.com/api/v2/shop/get_shop_info",
			Some("https://partner.shopeemobile.com/api/v2/order/get_order_list"),
			Some("https://partner.shopeemobile.com/api/v2/product/get_item_list"),
			None,
		)?)
		.bind(ApiKeyBinding::query("shop_id", "shop_id"))
		.build()
}

fn magazine_luiza() -> Result<ProviderConfig, ProviderConfigError> {
	ProviderConfig::builder(key("magazine_luiza")?, AuthType::ApiKey)
		.display_name("Magazine Luiza")
		.required_fields(["api_key", "seller_id"])
		.endpoints(endpoints(
			"https://api.magalu.com/seller/v1/sellers/me",
			Some("https://api.magalu.com/seller/v1/orders"),
			Some("https://api.magalu.com/seller/v1/portfolios/skus"),
			Some("https://api.magalu.com/seller/v1/portfolios/stocks"),
		)?)
		.bind(ApiKeyBinding::header("api_key", "X-Api-Key"))
		.bind(ApiKeyBinding::header("seller_id", "X-Seller-Id"))
		.build()
}

fn americanas() -> Result<ProviderConfig, ProviderConfigError> {
	ProviderConfig::builder(key("americanas")?, AuthType::ApiKey)
		.display_name("Americanas Marketplace")
		.required_fields(["user_email", "api_key"])
		.endpoints(endpoints(
			"https://api.skyhub.com.br/account",
			Some("https://api.skyhub.com.br/orders"),
			Some("https://api.skyhub.com.br/products"),
			None,
		)?)
		.bind(ApiKeyBinding::header("user_email", "X-User-Email"))
		.bind(ApiKeyBinding::header("api_key", "X-Api-Key"))
		.build()
}
