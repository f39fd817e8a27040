// self
use crate::{_prelude::*, auth::AccountName};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by gateway operations.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(operation: &'static str, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("hsadmin_gateway.call", operation, stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a freshly issued grant.
pub fn grant_issued(account: &AccountName, expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::debug!(account = %account, %expires_at, "issued upstream grant");
	#[cfg(not(feature = "tracing"))]
	let _ = (account, expires_at);
}

/// Logs expired grants discarded while searching a free-list.
pub fn grants_purged(account: &AccountName, count: usize) {
	#[cfg(feature = "tracing")]
	tracing::debug!(account = %account, count, "purged expired grants");
	#[cfg(not(feature = "tracing"))]
	let _ = (account, count);
}

/// Logs a grant dropped on release because it expired while leased.
pub fn grant_dropped(account: &AccountName) {
	#[cfg(feature = "tracing")]
	tracing::debug!(account = %account, "dropped grant that expired during its lease");
	#[cfg(not(feature = "tracing"))]
	let _ = account;
}

/// Logs a leased operation that overran its deadline and had its grant force-released.
pub fn lease_timed_out(account: &AccountName, after: Duration) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		account = %account,
		deadline = %after,
		"leased operation exceeded its deadline; grant force-released"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (account, after);
}
