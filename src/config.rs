//! Broker runtime configuration.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable overriding [`BrokerConfig::request_timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "MARKETPLACE_AUTH_TIMEOUT_SECS";
/// Environment variable overriding [`BrokerConfig::mirror_attempts`].
pub const ENV_MIRROR_ATTEMPTS: &str = "MARKETPLACE_AUTH_MIRROR_ATTEMPTS";
/// Environment variable overriding [`BrokerConfig::user_agent`].
pub const ENV_USER_AGENT: &str = "MARKETPLACE_AUTH_USER_AGENT";

const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=9;
const MIRROR_ATTEMPTS_RANGE: std::ops::RangeInclusive<u32> = 1..=5;

/// Tunables shared by every broker invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
	/// Upper bound for a single provider call, in seconds.
	pub request_timeout_secs: u64,
	/// Channel mirror attempts before a store write is rolled back.
	pub mirror_attempts: u32,
	/// `User-Agent` sent to provider endpoints.
	pub user_agent: String,
}
impl BrokerConfig {
	/// Parses and validates a JSON document. Absent keys keep their defaults.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let config: Self = serde_path_to_error::deserialize(&mut de).map_err(|e| {
			ConfigError::Malformed { path: e.path().to_string(), message: e.inner().to_string() }
		})?;

		config.validate()
	}

	/// Loads overrides from the process environment on top of the defaults.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads overrides through `lookup`, which maps a variable name to its value.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let mut config = Self::default();

		if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
			config.request_timeout_secs = parse_number(ENV_TIMEOUT_SECS, &raw)?;
		}
		if let Some(raw) = lookup(ENV_MIRROR_ATTEMPTS) {
			config.mirror_attempts = parse_number(ENV_MIRROR_ATTEMPTS, &raw)?;
		}
		if let Some(raw) = lookup(ENV_USER_AGENT) {
			config.user_agent = raw;
		}

		config.validate()
	}

	/// Checks value ranges.
	pub fn validate(self) -> Result<Self, ConfigError> {
		if !TIMEOUT_RANGE.contains(&self.request_timeout_secs) {
			return Err(ConfigError::InvalidValue {
				key: "request_timeout_secs",
				reason: format!(
					"{} is outside {}..={} seconds",
					self.request_timeout_secs,
					TIMEOUT_RANGE.start(),
					TIMEOUT_RANGE.end()
				),
			});
		}
		if !MIRROR_ATTEMPTS_RANGE.contains(&self.mirror_attempts) {
			return Err(ConfigError::InvalidValue {
				key: "mirror_attempts",
				reason: format!(
					"{} is outside {}..={}",
					self.mirror_attempts,
					MIRROR_ATTEMPTS_RANGE.start(),
					MIRROR_ATTEMPTS_RANGE.end()
				),
			});
		}
		if self.user_agent.trim().is_empty() {
			return Err(ConfigError::InvalidValue {
				key: "user_agent",
				reason: "must not be blank".into(),
			});
		}

		Ok(self)
	}

	/// Provider call timeout.
	pub fn request_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.request_timeout_secs)
	}
}
impl Default for BrokerConfig {
	fn default() -> Self {
		Self {
			request_timeout_secs: 8,
			mirror_attempts: 2,
			user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
		}
	}
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: Display,
{
	raw.trim()
		.parse()
		.map_err(|e| ConfigError::InvalidValue { key, reason: format!("`{raw}` is not a number: {e}") })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_are_valid() {
		let config = BrokerConfig::default().validate().expect("Defaults should validate.");

		assert_eq!(config.request_timeout(), StdDuration::from_secs(8));
		assert_eq!(config.mirror_attempts, 2);
		assert!(config.user_agent.starts_with("marketplace-auth-broker/"));
	}

	#[test]
	fn json_overrides_and_reports_paths() {
		let config = BrokerConfig::from_json_str(r#"{"request_timeout_secs": 3}"#)
			.expect("Partial document should parse.");

		assert_eq!(config.request_timeout_secs, 3);
		assert_eq!(config.mirror_attempts, 2);

		let err = BrokerConfig::from_json_str(r#"{"mirror_attempts": "two"}"#)
			.expect_err("Wrong type should be rejected.");

		assert!(matches!(err, ConfigError::Malformed { ref path, .. } if path == "mirror_attempts"));
		assert!(matches!(
			BrokerConfig::from_json_str(r#"{"request_timeout_secs": 30}"#),
			Err(ConfigError::InvalidValue { key: "request_timeout_secs", .. })
		));
	}

	#[test]
	fn lookup_overrides_defaults() {
		let vars = HashMap::from([
			(ENV_TIMEOUT_SECS, "5".to_owned()),
			(ENV_USER_AGENT, "tenant-app/2.0".to_owned()),
		]);
		let config = BrokerConfig::from_lookup(|key| vars.get(key).cloned())
			.expect("Environment overrides should validate.");

		assert_eq!(config.request_timeout_secs, 5);
		assert_eq!(config.user_agent, "tenant-app/2.0");
		assert!(matches!(
			BrokerConfig::from_lookup(|key| (key == ENV_MIRROR_ATTEMPTS).then(|| "many".into())),
			Err(ConfigError::InvalidValue { key: ENV_MIRROR_ATTEMPTS, .. })
		));
	}
}
