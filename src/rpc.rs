//! Upstream remote-procedure contracts: values, faults, method names, and transports.

pub mod value;
pub mod xml;

#[cfg(feature = "reqwest")] mod transport;

pub use value::*;
#[cfg(feature = "reqwest")] pub use transport::XmlRpcTransport;

// self
use crate::{_prelude::*, auth::ObjectType};

/// Boxed future returned by [`RpcTransport::call`].
pub type RpcFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Remote-procedure endpoint the gateway forwards authenticated calls to.
pub trait RpcTransport
where
	Self: Send + Sync,
{
	/// Invokes `method` with positional `params`.
	///
	/// A structured upstream fault surfaces as [`Error::UpstreamFault`].
	fn call<'a>(&'a self, method: &'a RpcMethod, params: Vec<RpcValue>) -> RpcFuture<'a, RpcValue>;
}

/// Structured fault returned by the upstream instead of a result.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Upstream fault {code}: {message}")]
pub struct RpcFault {
	/// Upstream fault code.
	pub code: i64,
	/// Upstream fault string.
	pub message: String,
}

/// CRUD verbs understood by every upstream object module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// List records matching a filter.
	Search,
	/// Create a record.
	Add,
	/// Mutate fields of matching records.
	Update,
	/// Remove matching records.
	Delete,
}
impl Operation {
	/// Method-name suffix and metric label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Search => "search",
			Operation::Add => "add",
			Operation::Update => "update",
			Operation::Delete => "delete",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully qualified upstream method, rendered as `<object>.<operation>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RpcMethod {
	/// Object module.
	pub object: ObjectType,
	/// Verb applied to the module.
	pub operation: Operation,
}
impl RpcMethod {
	/// Creates a method for the provided object + operation.
	pub fn new(object: ObjectType, operation: Operation) -> Self {
		Self { object, operation }
	}
}
impl Display for RpcMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}.{}", self.object, self.operation)
	}
}
