//! Redacted wrappers for account secrets and tenant API keys.

// std
use std::borrow::Borrow;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Upstream account password; redacted in every formatter.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountSecret(String);
impl AccountSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for AccountSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccountSecret").field(&"<redacted>").finish()
	}
}
impl Display for AccountSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Tenant-facing API key presented to the REST façade.
///
/// The key itself never reaches logs; [`fingerprint`](Self::fingerprint) yields a stable,
/// non-reversible label (base64 without padding of the first 12 SHA-256 bytes) for
/// correlation instead.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);
impl ApiKey {
	/// Wraps a new API key.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner key. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Stable fingerprint safe to log.
	pub fn fingerprint(&self) -> String {
		fingerprint(&self.0)
	}
}
impl Borrow<str> for ApiKey {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for ApiKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ApiKey").field(&self.fingerprint()).finish()
	}
}

/// Fingerprints a raw API key without wrapping it first.
pub fn fingerprint(raw: &str) -> String {
	let digest = Sha256::digest(raw.as_bytes());

	URL_SAFE_NO_PAD.encode(&digest[..12])
}
