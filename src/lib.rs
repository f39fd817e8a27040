//! Multi-tenant gateway core for the HSAdmin XML-RPC backend: CAS grant pooling, exclusive
//! ticket leases, and typed CRUD calls behind one async API.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod http;
pub mod issuer;
pub mod obs;
pub mod pool;
pub mod rpc;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{PoolConfig, UpstreamConfig},
		credentials::CredentialTable,
		gateway::Gateway,
		http::ReqwestHttpClient,
		issuer::CasTicketIssuer,
		pool::GrantPool,
		rpc::XmlRpcTransport,
	};

	/// Builds a reqwest HTTP client suitable for talking to `httpmock` servers.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Points every upstream endpoint at the provided mock server base URL.
	pub fn test_upstream_config(base_url: &str) -> UpstreamConfig {
		let parse = |path: &str| {
			Url::parse(&format!("{base_url}{path}")).expect("Mock endpoint URL should parse.")
		};

		UpstreamConfig {
			ticket_url: parse("/cas/v1/tickets"),
			service: format!("{base_url}/hsar/backend"),
			backend_url: parse("/hsar/xmlrpc/hsadmin"),
			connect_timeout: Duration::seconds(5),
			request_timeout: Duration::seconds(10),
		}
	}

	/// Constructs a [`Gateway`] wired to reqwest-backed CAS and XML-RPC clients that target the
	/// provided upstream configuration.
	pub fn build_reqwest_test_gateway(
		upstream: &UpstreamConfig,
		credentials: CredentialTable,
	) -> (Gateway, Arc<GrantPool>) {
		let http_client = test_reqwest_http_client();
		let issuer = Arc::new(CasTicketIssuer::new(http_client.clone(), upstream));
		let pool = Arc::new(GrantPool::new(issuer, PoolConfig::default()));
		let transport = Arc::new(XmlRpcTransport::new(http_client, upstream.backend_url.clone()));
		let gateway = Gateway::new(pool.clone(), transport, Arc::new(credentials));

		(gateway, pool)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
