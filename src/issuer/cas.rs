//! Reqwest-backed CAS REST client.

// self
use crate::{
	_prelude::*,
	auth::AccountKey,
	config::UpstreamConfig,
	error::ProtocolError,
	http::ReqwestHttpClient,
	issuer::{self, IssuerFuture, ServiceTicket, TicketIssuer},
	pool::GrantToken,
};

/// [`TicketIssuer`] that speaks the CAS REST protocol over reqwest.
///
/// Neither leg retries: a transient network failure surfaces immediately as
/// [`Error::Transport`](crate::error::Error::Transport).
#[derive(Clone, Debug)]
pub struct CasTicketIssuer {
	http_client: ReqwestHttpClient,
	ticket_url: Url,
	service: String,
}
impl CasTicketIssuer {
	/// Creates an issuer for the configured ticket-granting endpoint and service identifier.
	pub fn new(http_client: ReqwestHttpClient, upstream: &UpstreamConfig) -> Self {
		Self {
			http_client,
			ticket_url: upstream.ticket_url.clone(),
			service: upstream.service.clone(),
		}
	}

	async fn request_grant(&self, account: &AccountKey) -> Result<GrantToken> {
		let reply = self
			.http_client
			.post_form(
				"ticket",
				self.ticket_url.clone(),
				&[("username", account.name.as_ref()), ("password", account.secret.expose())],
			)
			.await?;
		let Some(action) = issuer::extract_action_url(&reply.body) else {
			return Err(Error::Authentication {
				account: account.name.to_string(),
				reason: format!(
					"ticket-granting endpoint answered HTTP {} without an action URL",
					reply.status
				),
			});
		};
		// Relative actions resolve against the ticket endpoint; absolute ones pass through.
		let url = self
			.ticket_url
			.join(action)
			.map_err(|source| ProtocolError::InvalidGrantUrl { source })?;

		Ok(GrantToken::new(url))
	}

	async fn request_service_ticket(&self, grant: &GrantToken) -> Result<ServiceTicket> {
		let url =
			Url::parse(grant.expose()).map_err(|source| ProtocolError::InvalidGrantUrl { source })?;
		let reply = self
			.http_client
			.post_form("service_ticket", url, &[("service", self.service.as_str())])
			.await?;
		let ticket = reply.body.trim();

		if ticket.is_empty() {
			return Err(ProtocolError::EmptyServiceTicket.into());
		}

		Ok(ServiceTicket::new(ticket))
	}
}
impl TicketIssuer for CasTicketIssuer {
	fn issue_grant<'a>(&'a self, account: &'a AccountKey) -> IssuerFuture<'a, GrantToken> {
		Box::pin(self.request_grant(account))
	}

	fn issue_service_ticket<'a>(
		&'a self,
		grant: &'a GrantToken,
	) -> IssuerFuture<'a, ServiceTicket> {
		Box::pin(self.request_service_ticket(grant))
	}
}
