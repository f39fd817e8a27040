//! Gateway-level error types shared across the pool, issuer, transport, and resolver.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// API key or account hint could not be resolved against the credential table.
	#[error(transparent)]
	Credentials(#[from] crate::credentials::CredentialError),
	/// Transport failure (DNS, TCP, TLS, unexpected HTTP status).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Upstream replied with a payload the gateway cannot interpret.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Upstream returned a structured XML-RPC fault.
	#[error("{0}")]
	UpstreamFault(
		#[from]
		#[source]
		crate::rpc::RpcFault,
	),

	/// Ticket-granting endpoint rejected the account credentials.
	#[error("Upstream rejected the credentials of account `{account}`: {reason}.")]
	Authentication {
		/// Account whose credentials were rejected.
		account: String,
		/// Gateway-supplied reason string.
		reason: String,
	},
	/// Caller supplied a payload the upstream (or the gateway) refuses.
	#[error("Invalid input: {reason}.")]
	InvalidInput {
		/// Human-readable reason string.
		reason: String,
	},
	/// A lookup matched no upstream record.
	#[error("No `{object}` record matched the filter.")]
	NotFound {
		/// Object type that was searched.
		object: String,
	},
	/// The leased operation exceeded its deadline and the grant was force-released.
	#[error("Operation for account `{account}` exceeded the lease deadline of {after}.")]
	LeaseTimeout {
		/// Account whose grant was leased.
		account: String,
		/// Deadline that elapsed.
		after: Duration,
	},
}
impl Error {
	/// HTTP status the REST façade should answer with for this error.
	///
	/// Credential problems are always client errors: an unknown API key is `401`, a
	/// missing or unauthorized account hint is `400`. Failures talking to the upstream
	/// (rejected account credentials, network errors, malformed replies) are `502`, a
	/// lease deadline is `504`, and everything else is `500`.
	pub fn status_code(&self) -> u16 {
		use crate::credentials::CredentialError;

		match self {
			Self::NotFound { .. } => 404,
			Self::InvalidInput { .. } => 400,
			Self::Credentials(CredentialError::UnknownApiKey { .. }) => 401,
			Self::Credentials(_) => 400,
			Self::Authentication { .. } | Self::Transport(_) | Self::Protocol(_) => 502,
			Self::LeaseTimeout { .. } => 504,
			Self::Config(_) | Self::UpstreamFault(_) => 500,
		}
	}
}

/// Configuration and validation failures raised while assembling the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Configuration file could not be read.
	#[error("Configuration file `{path}` could not be read.")]
	Read {
		/// Path that failed to load.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Configuration document is not valid YAML for the expected shape.
	#[error("Configuration is malformed at `{path}`.")]
	Parse {
		/// Field path where deserialization failed.
		path: String,
		/// Underlying YAML failure.
		#[source]
		source: serde_yaml::Error,
	},
	/// An endpoint URL is not an absolute http(s) URL.
	#[error("The {endpoint} endpoint must be an http(s) URL: {url}.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A configured duration must be strictly positive.
	#[error("The `{field}` setting must be positive.")]
	NonPositiveDuration {
		/// Setting that failed validation.
		field: &'static str,
	},
	/// Account table entry is invalid.
	#[error("Account entry `{account}` is invalid: {reason}.")]
	InvalidAccount {
		/// Offending account name (possibly empty).
		account: String,
		/// Validation failure.
		reason: String,
	},
	/// An API key entry is empty.
	#[error("API key entry #{index} has an empty key.")]
	EmptyApiKey {
		/// Zero-based position of the entry.
		index: usize,
	},
	/// An API key entry grants no accounts.
	#[error("API key entry #{index} does not grant any account.")]
	NoAccounts {
		/// Zero-based position of the entry.
		index: usize,
	},
	/// An API key entry references an account missing from the account table.
	#[error("API key entry #{index} references unknown account `{account}`.")]
	UnknownAccount {
		/// Zero-based position of the entry.
		index: usize,
		/// Account name that was not found.
		account: String,
	},
	/// The same API key appears more than once.
	#[error("API key entry #{index} duplicates an earlier key ({fingerprint}).")]
	DuplicateApiKey {
		/// Zero-based position of the duplicate.
		index: usize,
		/// Fingerprint of the duplicated key.
		fingerprint: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint label (ticket, service_ticket, backend).
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Upstream answered with a non-success HTTP status.
	#[error("The {endpoint} endpoint answered with HTTP {status}.")]
	Status {
		/// Endpoint label (ticket, service_ticket, backend).
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the upstream.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Upstream payloads that do not match the expected protocol shape.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// XML could not be tokenized.
	#[error("Upstream returned malformed XML.")]
	Xml(#[from] quick_xml::Error),
	/// XML was well-formed but not a valid XML-RPC document.
	#[error("Unexpected XML-RPC structure: {message}.")]
	Structure {
		/// Description of the mismatch.
		message: String,
	},
	/// A scalar could not be parsed as its declared XML-RPC type.
	#[error("XML-RPC <{kind}> value `{raw}` is invalid.")]
	Scalar {
		/// Declared XML-RPC type.
		kind: &'static str,
		/// Raw text that failed to parse.
		raw: String,
	},
	/// The result had a different shape than the operation expects.
	#[error("Expected {expected} from `{method}`.")]
	UnexpectedResult {
		/// Method that was invoked.
		method: String,
		/// Expected shape.
		expected: &'static str,
	},
	/// The service-ticket endpoint answered with an empty body.
	#[error("Service-ticket endpoint returned an empty ticket.")]
	EmptyServiceTicket,
	/// The ticket-granting response pointed to an unusable action URL.
	#[error("Ticket-granting response carried an invalid action URL.")]
	InvalidGrantUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ProtocolError {
	pub(crate) fn structure(message: impl Into<String>) -> Self {
		Self::Structure { message: message.into() }
	}
}
