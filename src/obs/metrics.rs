// self
use crate::obs::{CallOutcome, PoolEvent};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(operation: &'static str, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"hsadmin_gateway_call_total",
			"operation" => operation,
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}

/// Records a pool lifecycle event via the global metrics recorder (when enabled).
pub fn record_pool_event(event: PoolEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("hsadmin_gateway_pool_event_total", "event" => event.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = event;
	}
}
