//! Optional observability helpers for the obtain path.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `token_warden.obtain` with a `stage` field, plus a
//!   debug event when a quota wait begins.
//! - Enable `metrics` to increment the `token_warden_obtain_total` counter for every
//!   attempt/hit/refresh/success/failure, labeled by `outcome`.

// self
use crate::_prelude::*;

/// Outcome labels recorded for obtain calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObtainOutcome {
	/// Entry into the obtain path.
	Attempt,
	/// The cached token was returned without a network call.
	Hit,
	/// A refresh request is about to be dispatched.
	Refresh,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl ObtainOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ObtainOutcome::Attempt => "attempt",
			ObtainOutcome::Hit => "hit",
			ObtainOutcome::Refresh => "refresh",
			ObtainOutcome::Success => "success",
			ObtainOutcome::Failure => "failure",
		}
	}
}
impl Display for ObtainOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records an obtain outcome via the global metrics recorder (when enabled).
pub fn record_obtain_outcome(outcome: ObtainOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("token_warden_obtain_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Emits a debug event when a quota wait begins (when tracing is enabled).
pub fn record_quota_wait(delay: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			target: "token_warden",
			delay_secs = delay.as_secs_f64(),
			"Quota exhausted; waiting for the window to reset."
		);
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = delay;
	}
}

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedObtain<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedObtain<F> = F;

/// A span builder used by the obtain path.
#[derive(Clone, Debug)]
pub struct ObtainSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ObtainSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("token_warden.obtain", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedObtain<Fut>
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
