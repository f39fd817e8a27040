//! Ticket issuance contracts and the CAS-backed implementation.
//!
//! The upstream authenticates every XML-RPC call with a single-use service ticket. Service
//! tickets are minted from a longer-lived grant (the CAS ticket-granting ticket), and minting a
//! new grant for an account invalidates the grant issued before it. [`TicketIssuer`] models
//! both legs of that handshake so the grant pool can stay transport agnostic.

#[cfg(feature = "reqwest")] pub mod cas;

#[cfg(feature = "reqwest")] pub use cas::CasTicketIssuer;

// std
use std::sync::LazyLock;
// crates.io
use regex::Regex;
// self
use crate::{_prelude::*, auth::AccountKey, pool::GrantToken};

/// Boxed future returned by [`TicketIssuer`] methods.
pub type IssuerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Two-legged authentication handshake against the upstream.
pub trait TicketIssuer
where
	Self: Send + Sync,
{
	/// Submits the account credentials and returns a fresh grant token.
	///
	/// Fails with [`Error::Authentication`] when the upstream rejects the credentials.
	fn issue_grant<'a>(&'a self, account: &'a AccountKey) -> IssuerFuture<'a, GrantToken>;

	/// Exchanges a grant for a single-use service ticket.
	fn issue_service_ticket<'a>(&'a self, grant: &'a GrantToken)
	-> IssuerFuture<'a, ServiceTicket>;
}

/// Single-use credential for exactly one upstream call.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceTicket(String);
impl ServiceTicket {
	/// Wraps a new service ticket.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner ticket. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for ServiceTicket {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ServiceTicket").field(&"<redacted>").finish()
	}
}

const ACTION_MARKER_PATTERN: &str = r#"action="([^"]+)""#;

static ACTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(ACTION_MARKER_PATTERN).expect("Action marker pattern must be a valid regex.")
});

/// Locates the grant action URL inside a ticket-granting response body.
///
/// Returns `None` when the marker is absent, which the upstream does for rejected credentials.
pub fn extract_action_url(body: &str) -> Option<&str> {
	ACTION_MARKER.captures(body).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn action_url_is_extracted_from_form_markup() {
		let body = r#"<!DOCTYPE HTML><html><body><h1>TGT Created</h1>
<form action="https://login.example/cas/v1/tickets/TGT-1-abc" method="POST">
Service:<input type="text" name="service" value=""><br><input type="submit" value="Submit"></form>
</body></html>"#;

		assert_eq!(
			extract_action_url(body),
			Some("https://login.example/cas/v1/tickets/TGT-1-abc")
		);
	}

	#[test]
	fn action_marker_pattern_compiles() {
		Regex::new(ACTION_MARKER_PATTERN).expect("Action marker pattern should compile.");
		assert_eq!(ACTION_MARKER.captures_len(), 2);
	}

	#[test]
	fn missing_marker_yields_none() {
		assert_eq!(extract_action_url("<html>error.authentication.credentials.bad</html>"), None);
		assert_eq!(extract_action_url("action=\"\""), None);
	}

	#[test]
	fn service_ticket_debug_redacts() {
		assert_eq!(format!("{:?}", ServiceTicket::new("ST-1")), "ServiceTicket(\"<redacted>\")");
	}
}
