//! YAML configuration for the gateway core.
//!
//! Only the sections the core consumes are modeled; anything else in the document (process
//! or HTTP server settings, for example) is ignored. A minimal file:
//!
//! ```yaml
//! pool:
//!   lease_horizon_secs: 3000
//!   lease_timeout_secs: 300
//! pacs:
//!   xyz00: package-password
//! api:
//!   - key: tenant-api-key
//!     pacs: xyz00
//! ```

// std
use std::path::Path;
// self
use crate::{
	_prelude::*,
	credentials::{ApiKeyEntry, CredentialTable},
	error::ConfigError,
};

/// CAS ticket-granting endpoint of the reference upstream.
pub const DEFAULT_TICKET_URL: &str = "https://login.hostsharing.net/cas/v1/tickets";
/// Service identifier service tickets are requested for.
pub const DEFAULT_SERVICE: &str = "https://config.hostsharing.net:443/hsar/backend";
/// XML-RPC endpoint of the reference upstream.
pub const DEFAULT_BACKEND_URL: &str = "https://config.hostsharing.net:443/hsar/xmlrpc/hsadmin";

const DEFAULT_LEASE_HORIZON_SECS: u64 = 3000;
const DEFAULT_LEASE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Fully validated gateway configuration.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
	/// Upstream endpoints and HTTP timeouts.
	pub upstream: UpstreamConfig,
	/// Grant pool tuning.
	pub pool: PoolConfig,
	/// API key → account table.
	pub credentials: CredentialTable,
}
impl GatewayConfig {
	/// Reads and validates a YAML configuration file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;

		Self::from_yaml_str(&raw)
	}

	/// Parses and validates a YAML configuration document.
	pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
		let document: RawConfig = parse_yaml(raw)?;

		Ok(Self {
			upstream: document.upstream.try_into()?,
			pool: document.pool.try_into()?,
			credentials: CredentialTable::new(document.pacs, document.api)?,
		})
	}
}

/// Upstream endpoints and HTTP client timeouts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamConfig {
	/// CAS ticket-granting endpoint.
	pub ticket_url: Url,
	/// Service identifier sent when exchanging a grant for a service ticket.
	pub service: String,
	/// XML-RPC endpoint.
	pub backend_url: Url,
	/// TCP/TLS connect timeout.
	pub connect_timeout: Duration,
	/// Whole-request timeout applied to every upstream HTTP call.
	pub request_timeout: Duration,
}
impl UpstreamConfig {
	/// Endpoints of the reference upstream with default timeouts.
	pub fn reference() -> Result<Self, ConfigError> {
		UpstreamSection::default().try_into()
	}

	/// Connect timeout as a std duration.
	pub fn connect_timeout(&self) -> std::time::Duration {
		self.connect_timeout.try_into().unwrap_or_default()
	}

	/// Request timeout as a std duration.
	pub fn request_timeout(&self) -> std::time::Duration {
		self.request_timeout.try_into().unwrap_or_default()
	}
}

/// Grant pool tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
	/// How long after issuance a grant is handed out. The upstream does not report grant
	/// lifetimes, so this is an approximation kept below the CAS ticket-granting timeout.
	pub lease_horizon: Duration,
	/// Deadline for an operation holding a lease; `None` disables it.
	pub lease_timeout: Option<Duration>,
	/// Allow at most one in-flight issuance per account.
	pub serialize_issuance: bool,
}
impl Default for PoolConfig {
	fn default() -> Self {
		Self {
			lease_horizon: secs(DEFAULT_LEASE_HORIZON_SECS),
			lease_timeout: Some(secs(DEFAULT_LEASE_TIMEOUT_SECS)),
			serialize_issuance: false,
		}
	}
}

#[derive(Debug, Deserialize)]
struct RawConfig {
	#[serde(default)]
	upstream: UpstreamSection,
	#[serde(default)]
	pool: PoolSection,
	pacs: BTreeMap<String, String>,
	api: Vec<ApiKeyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct UpstreamSection {
	ticket_url: String,
	service: String,
	backend_url: String,
	connect_timeout_secs: u64,
	request_timeout_secs: u64,
}
impl Default for UpstreamSection {
	fn default() -> Self {
		Self {
			ticket_url: DEFAULT_TICKET_URL.into(),
			service: DEFAULT_SERVICE.into(),
			backend_url: DEFAULT_BACKEND_URL.into(),
			connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
			request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
		}
	}
}
impl TryFrom<UpstreamSection> for UpstreamConfig {
	type Error = ConfigError;

	fn try_from(section: UpstreamSection) -> Result<Self, Self::Error> {
		Ok(Self {
			ticket_url: http_url("ticket", &section.ticket_url)?,
			service: section.service,
			backend_url: http_url("backend", &section.backend_url)?,
			connect_timeout: positive("upstream.connect_timeout_secs", section.connect_timeout_secs)?,
			request_timeout: positive("upstream.request_timeout_secs", section.request_timeout_secs)?,
		})
	}
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PoolSection {
	lease_horizon_secs: u64,
	lease_timeout_secs: Option<u64>,
	serialize_issuance: bool,
}
impl Default for PoolSection {
	fn default() -> Self {
		Self {
			lease_horizon_secs: DEFAULT_LEASE_HORIZON_SECS,
			lease_timeout_secs: Some(DEFAULT_LEASE_TIMEOUT_SECS),
			serialize_issuance: false,
		}
	}
}
impl TryFrom<PoolSection> for PoolConfig {
	type Error = ConfigError;

	fn try_from(section: PoolSection) -> Result<Self, Self::Error> {
		Ok(Self {
			lease_horizon: positive("pool.lease_horizon_secs", section.lease_horizon_secs)?,
			lease_timeout: section
				.lease_timeout_secs
				.map(|value| positive("pool.lease_timeout_secs", value))
				.transpose()?,
			serialize_issuance: section.serialize_issuance,
		})
	}
}

fn parse_yaml<T>(raw: &str) -> Result<T, ConfigError>
where
	T: for<'de> Deserialize<'de>,
{
	let deserializer = serde_yaml::Deserializer::from_str(raw);

	serde_path_to_error::deserialize(deserializer).map_err(|e| {
		let path = e.path().to_string();

		ConfigError::Parse { path, source: e.into_inner() }
	})
}

fn http_url(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	match Url::parse(raw) {
		Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(url),
		_ => Err(ConfigError::InvalidEndpoint { endpoint, url: raw.into() }),
	}
}

fn positive(field: &'static str, value: u64) -> Result<Duration, ConfigError> {
	if value == 0 {
		return Err(ConfigError::NonPositiveDuration { field });
	}

	Ok(secs(value))
}

fn secs(value: u64) -> Duration {
	Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX))
}
