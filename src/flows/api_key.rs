//! Required-field validation for static credentials.

// self
use crate::{auth::CredentialPayload, error::ValidationError, provider::ProviderConfig};

/// Checks that every field `config` requires is present and non-blank.
///
/// The error lists all missing fields at once, in configuration order.
pub fn validate_fields(
	config: &ProviderConfig,
	credentials: &CredentialPayload,
) -> Result<(), ValidationError> {
	require_fields(config, credentials, config.required_fields.iter().map(String::as_str))
}

/// Checks an explicit subset of fields against `credentials`.
pub fn require_fields<'a>(
	config: &ProviderConfig,
	credentials: &CredentialPayload,
	fields: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
	let missing = fields
		.into_iter()
		.filter(|field| !credentials.has_value(field))
		.map(str::to_owned)
		.collect::<Vec<_>>();

	if missing.is_empty() {
		Ok(())
	} else {
		Err(ValidationError::MissingFields { provider: config.id.to_string(), fields: missing })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::ProviderRegistry;

	fn magalu() -> ProviderConfig {
		ProviderRegistry::marketplaces()
			.expect("Built-in catalog should validate.")
			.lookup("magazine_luiza")
			.expect("Catalog should contain magazine_luiza.")
			.clone()
	}

	#[test]
	fn reports_every_missing_or_blank_field() {
		let config = magalu();
		let credentials = CredentialPayload::from_fields([("seller_id", " ")]);

		assert_eq!(
			validate_fields(&config, &credentials),
			Err(ValidationError::MissingFields {
				provider: "magazine_luiza".into(),
				fields: vec!["api_key".into(), "seller_id".into()],
			})
		);
	}

	#[test]
	fn accepts_complete_credentials_with_extras() {
		let credentials = CredentialPayload::from_fields([
			("api_key", "K"),
			("seller_id", "S"),
			("nickname", "main store"),
		]);

		assert_eq!(validate_fields(&magalu(), &credentials), Ok(()));
	}
}
