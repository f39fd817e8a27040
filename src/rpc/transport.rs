//! Reqwest-backed XML-RPC transport.

// self
use crate::{
	_prelude::*,
	error::TransportError,
	http::ReqwestHttpClient,
	rpc::{RpcFuture, RpcMethod, RpcTransport, RpcValue, xml},
};

/// [`RpcTransport`] that POSTs `<methodCall>` documents to a single backend URL.
#[derive(Clone, Debug)]
pub struct XmlRpcTransport {
	http_client: ReqwestHttpClient,
	backend_url: Url,
}
impl XmlRpcTransport {
	/// Creates a transport for the provided backend endpoint.
	pub fn new(http_client: ReqwestHttpClient, backend_url: Url) -> Self {
		Self { http_client, backend_url }
	}

	/// Backend endpoint calls are sent to.
	pub fn backend_url(&self) -> &Url {
		&self.backend_url
	}

	async fn post_call(&self, method: &RpcMethod, params: Vec<RpcValue>) -> Result<RpcValue> {
		let body = xml::encode_call(&method.to_string(), &params)?;
		let reply = self.http_client.post_xml("backend", self.backend_url.clone(), body).await?;

		if !reply.is_success() {
			return Err(TransportError::Status { endpoint: "backend", status: reply.status }.into());
		}

		match xml::decode_response(&reply.body)? {
			Ok(value) => Ok(value),
			Err(fault) => Err(Error::UpstreamFault(fault)),
		}
	}
}
impl RpcTransport for XmlRpcTransport {
	fn call<'a>(&'a self, method: &'a RpcMethod, params: Vec<RpcValue>) -> RpcFuture<'a, RpcValue> {
		Box::pin(self.post_call(method, params))
	}
}
