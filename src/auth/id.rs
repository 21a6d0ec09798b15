//! Validated identifiers for tenants, providers, and channel records.
//!
//! Every identifier rejects empty values, whitespace, and anything longer than
//! [`IDENTIFIER_MAX_LEN`]. Provider keys are further restricted to lowercase keys so they can
//! double as default channel references and metric labels.

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

/// Longest accepted identifier, in bytes.
pub const IDENTIFIER_MAX_LEN: usize = 128;

macro_rules! def_id {
	($(#[$meta:meta])* $name:ident { kind: $kind:literal, charset: $charset:expr $(,)? }) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Label used in validation errors.
			pub const KIND: &'static str = $kind;

			/// Validates `value` and wraps it.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				Self::try_from(value.as_ref().to_owned())
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				check(Self::KIND, &value, $charset)?;

				Ok(Self(value))
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", Self::KIND, self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// Empty value.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Identifier kind (tenant, provider, channel).
		kind: &'static str,
	},
	/// Value contains whitespace.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Identifier kind (tenant, provider, channel).
		kind: &'static str,
	},
	/// Value is longer than [`IDENTIFIER_MAX_LEN`].
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Identifier kind (tenant, provider, channel).
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
	/// Value contains a character outside the identifier's charset.
	#[error("{kind} key `{value}` must be lowercase snake_case.")]
	InvalidProviderKey {
		/// Identifier kind (always provider).
		kind: &'static str,
		/// Rejected key.
		value: String,
	},
}

def_id! {
	/// Business entity owning credentials.
	TenantId { kind: "Tenant", charset: any_char }
}
def_id! {
	/// Registry key of a marketplace provider, e.g. `mercado_livre`.
	ProviderId { kind: "Provider", charset: provider_key_char }
}
def_id! {
	/// Tenant-owned channel record whose `connected` flag the broker mirrors.
	ChannelRef { kind: "Channel", charset: any_char }
}

fn any_char(_: char) -> bool {
	true
}

fn provider_key_char(c: char) -> bool {
	c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'
}

fn check(kind: &'static str, value: &str, charset: fn(char) -> bool) -> Result<(), IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if value.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if value.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}
	if !value.chars().all(charset) {
		return Err(IdentifierError::InvalidProviderKey { kind, value: value.to_owned() });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_trim_and_validate() {
		assert!(TenantId::new(" tenant-123").is_err(), "Leading whitespace must be rejected.");
		assert!(TenantId::new("tenant-123 ").is_err(), "Trailing whitespace must be rejected.");

		let tenant =
			TenantId::new("tenant-123").expect("Tenant fixture should be considered valid.");

		assert_eq!(tenant.as_ref(), "tenant-123");
		assert!(ChannelRef::new("").is_err());
		assert!(ProviderId::new("mercado livre").is_err());
		assert!(matches!(
			ProviderId::new("MercadoLivre"),
			Err(IdentifierError::InvalidProviderKey { .. })
		));
		assert_eq!(
			ProviderId::new("mercado_livre").expect("Provider keys use snake_case.").as_ref(),
			"mercado_livre"
		);
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let payload = "\"tenant-42\"";
		let tenant: TenantId =
			serde_json::from_str(payload).expect("Tenant should deserialize successfully.");

		assert_eq!(tenant.as_ref(), "tenant-42");
		assert!(serde_json::from_str::<TenantId>("\"with space\"").is_err());
		assert!(serde_json::from_str::<TenantId>("\" tenant-42\"").is_err());
		assert!(serde_json::from_str::<ChannelRef>("\"\"").is_err());
	}

	#[test]
	fn unicode_whitespace_and_length_limits() {
		let nbsp = format!("tenant{}id", '\u{00A0}');

		assert!(TenantId::new(&nbsp).is_err());

		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		TenantId::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert!(TenantId::new(&too_long).is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<ProviderId, u8> = HashMap::from_iter([(
			ProviderId::new("magazine_luiza").expect("Provider used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("magazine_luiza"), Some(&7));
	}
}
