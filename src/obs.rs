//! Optional observability helpers for gateway calls and the grant pool.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `hsadmin_gateway.call` with the
//!   `operation` and `stage` fields, plus events for grant issuance, purges, and lease
//!   deadline overruns.
//! - Enable `metrics` to increment the `hsadmin_gateway_call_total` counter for every
//!   attempt/success/failure (labeled by `operation` + `outcome`) and the
//!   `hsadmin_gateway_pool_event_total` counter (labeled by `event`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each gateway call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a gateway operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Grant pool lifecycle events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolEvent {
	/// A cached grant satisfied an acquisition.
	Hit,
	/// No cached grant was usable and a new one was issued.
	Issued,
	/// An expired grant was purged from a free-list.
	Purged,
	/// A leased grant went back to its free-list.
	Released,
	/// A leased grant had expired by release time and was dropped.
	Dropped,
	/// A leased operation overran its deadline.
	TimedOut,
}
impl PoolEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PoolEvent::Hit => "hit",
			PoolEvent::Issued => "issued",
			PoolEvent::Purged => "purged",
			PoolEvent::Released => "released",
			PoolEvent::Dropped => "dropped",
			PoolEvent::TimedOut => "timed_out",
		}
	}
}
impl Display for PoolEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
