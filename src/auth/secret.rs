//! Secret wrapper that redacts sensitive material.

// std
use std::cmp::Reverse;
// self
use crate::_prelude::*;

/// Text written in place of a secret value.
pub const REDACTED: &str = "<redacted>";
// Shorter values would mangle unrelated words in error text.
const MIN_REDACT_LEN: usize = 4;

/// Redacted secret wrapper keeping tokens and API keys out of logs and envelopes.
///
/// Serialization is transparent so stores can persist the value; formatting never is.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for Secret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}

/// Replaces every occurrence of `secrets` in `text` with [`REDACTED`].
///
/// Longer values are replaced first so a secret that contains another one is never left half
/// visible. Values shorter than four characters are ignored.
pub fn redact<'a>(text: impl Into<String>, secrets: impl IntoIterator<Item = &'a str>) -> String {
	let mut secrets = secrets
		.into_iter()
		.map(str::trim)
		.filter(|secret| secret.len() >= MIN_REDACT_LEN)
		.collect::<Vec<_>>();

	secrets.sort_by_key(|secret| (Reverse(secret.len()), *secret));
	secrets.dedup();

	secrets.into_iter().fold(text.into(), |text, secret| text.replace(secret, REDACTED))
}
