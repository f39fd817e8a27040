//! RPC gateway tying credential resolution, grant leases, and upstream calls together.
//!
//! Every call follows the same path: lease a grant for the account, mint a single-use service
//! ticket from it, and invoke `<object>.<operation>` with the positional arguments
//! `(account, ticket, primary[, secondary])`. The lease is returned to the pool on every exit
//! path. The CRUD helpers in this module are naming conventions over [`Gateway::invoke`].

mod crud;

// self
use crate::{
	_prelude::*,
	auth::AccountKey,
	credentials::CredentialTable,
	obs::{self, CallOutcome, CallSpan},
	pool::GrantPool,
	rpc::{RpcMethod, RpcTransport, RpcValue},
};
#[cfg(feature = "reqwest")]
use crate::{
	config::GatewayConfig, http::ReqwestHttpClient, issuer::CasTicketIssuer, rpc::XmlRpcTransport,
};

/// Entry point the REST façade calls into.
///
/// Cloning is cheap; clones share the pool, transport, and credential table.
#[derive(Clone)]
pub struct Gateway {
	pool: Arc<GrantPool>,
	transport: Arc<dyn RpcTransport>,
	credentials: Arc<CredentialTable>,
}
impl Gateway {
	/// Assembles a gateway from already constructed collaborators.
	pub fn new(
		pool: Arc<GrantPool>,
		transport: Arc<dyn RpcTransport>,
		credentials: Arc<CredentialTable>,
	) -> Self {
		Self { pool, transport, credentials }
	}

	/// Builds the reqwest-backed CAS issuer, XML-RPC transport, and pool from configuration.
	#[cfg(feature = "reqwest")]
	pub fn from_config(config: &GatewayConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::from_config(&config.upstream)?;
		let issuer = Arc::new(CasTicketIssuer::new(http_client.clone(), &config.upstream));
		let pool = Arc::new(GrantPool::new(issuer, config.pool.clone()));
		let transport =
			Arc::new(XmlRpcTransport::new(http_client, config.upstream.backend_url.clone()));

		Ok(Self::new(pool, transport, Arc::new(config.credentials.clone())))
	}

	/// Grant pool backing this gateway.
	pub fn pool(&self) -> &GrantPool {
		&self.pool
	}

	/// Credential table used by [`Gateway::resolve`].
	pub fn credentials(&self) -> &CredentialTable {
		&self.credentials
	}

	/// Resolves an API key and optional account hint to the account a request runs as.
	pub fn resolve(&self, api_key: &str, hint: Option<&str>) -> Result<AccountKey> {
		Ok(self.credentials.resolve(api_key, hint)?)
	}

	/// Performs one authenticated upstream call as `account`.
	pub async fn invoke(
		&self,
		account: &AccountKey,
		method: &RpcMethod,
		primary: RpcValue,
		secondary: Option<RpcValue>,
	) -> Result<RpcValue> {
		let operation = method.operation.as_str();
		let span = CallSpan::new(operation, "invoke");

		obs::record_call_outcome(operation, CallOutcome::Attempt);

		let pool = self.pool.as_ref();
		let transport = self.transport.as_ref();
		let result = span
			.instrument(pool.with_grant(account, |grant| async move {
				let ticket = pool.issuer().issue_service_ticket(&grant.token).await?;
				let mut params = vec![
					RpcValue::from(&*account.name),
					RpcValue::from(ticket.expose()),
					primary,
				];

				params.extend(secondary);

				transport.call(method, params).await
			}))
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(operation, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(operation, CallOutcome::Failure),
		}

		result
	}

	/// Resolves the caller's account, then performs [`Gateway::invoke`].
	pub async fn invoke_for(
		&self,
		api_key: &str,
		hint: Option<&str>,
		method: &RpcMethod,
		primary: RpcValue,
		secondary: Option<RpcValue>,
	) -> Result<RpcValue> {
		let account = self.resolve(api_key, hint)?;

		self.invoke(&account, method, primary, secondary).await
	}
}
impl Debug for Gateway {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("pool", &self.pool)
			.field("credentials", &self.credentials)
			.finish()
	}
}
