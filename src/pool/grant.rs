//! Grant values held by the pool.

// self
use crate::_prelude::*;

/// Upstream ticket-granting artifact: the absolute action URL returned by the CAS login.
///
/// Anyone holding this URL can mint service tickets for the account, so it is redacted in
/// every formatter.
#[derive(Clone, PartialEq, Eq)]
pub struct GrantToken(String);
impl GrantToken {
	/// Wraps a new grant token.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for GrantToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("GrantToken").field(&"<redacted>").finish()
	}
}

/// Grant token plus the instant after which the pool stops handing it out.
#[derive(Clone, Debug)]
pub struct Grant {
	/// Upstream grant token.
	pub token: GrantToken,
	/// Instant the gateway obtained the token.
	pub issued_at: OffsetDateTime,
	/// Instant from which the grant is considered expired.
	pub expires_at: OffsetDateTime,
}
impl Grant {
	/// Creates a grant valid for `horizon` after `issued_at`.
	pub fn new(token: GrantToken, issued_at: OffsetDateTime, horizon: Duration) -> Self {
		Self { token, issued_at, expires_at: issued_at + horizon }
	}

	/// Returns `true` once `instant` has reached the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` if the grant is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
