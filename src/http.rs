//! Shared HTTP plumbing for the CAS and XML-RPC legs.
//!
//! [`ReqwestHttpClient`] is a thin wrapper so every upstream request goes through the same
//! client (connection pool, timeouts, redirect policy). Redirects are disabled: the CAS
//! endpoints answer directly, and silently following a redirect would re-post credentials
//! to an unexpected host.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
#[cfg(feature = "reqwest")]
use crate::{
	_prelude::*,
	config::UpstreamConfig,
	error::{ConfigError, TransportError},
};

/// Status and body of an upstream HTTP reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
	/// HTTP status code.
	pub status: u16,
	/// Decoded response body.
	pub body: String,
}
impl HttpReply {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// Configure any custom client to disable redirect following.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the configured connect/request timeouts.
	pub fn from_config(config: &UpstreamConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.connect_timeout(config.connect_timeout())
			.timeout(config.request_timeout())
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.build()?;

		Ok(Self(client))
	}

	/// POSTs a form-encoded body and returns the reply regardless of status.
	pub async fn post_form(
		&self,
		endpoint: &'static str,
		url: Url,
		form: &[(&str, &str)],
	) -> Result<HttpReply, TransportError> {
		let response = self
			.0
			.post(url)
			.form(form)
			.send()
			.await
			.map_err(|e| TransportError::network(endpoint, e))?;

		read_reply(endpoint, response).await
	}

	/// POSTs an XML document and returns the reply regardless of status.
	pub async fn post_xml(
		&self,
		endpoint: &'static str,
		url: Url,
		body: String,
	) -> Result<HttpReply, TransportError> {
		let response = self
			.0
			.post(url)
			.header(reqwest::header::CONTENT_TYPE, "text/xml")
			.body(body)
			.send()
			.await
			.map_err(|e| TransportError::network(endpoint, e))?;

		read_reply(endpoint, response).await
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

#[cfg(feature = "reqwest")]
async fn read_reply(
	endpoint: &'static str,
	response: reqwest::Response,
) -> Result<HttpReply, TransportError> {
	let status = response.status().as_u16();
	let body = response.text().await.map_err(|e| TransportError::network(endpoint, e))?;

	Ok(HttpReply { status, body })
}
