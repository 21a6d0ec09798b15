// self
use crate::{_prelude::*, obs::ActionKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedAction<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedAction<F> = F;

/// Span wrapping one broker action.
#[derive(Clone, Debug)]
pub struct ActionSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ActionSpan {
	/// Creates a span tagged with the action and provider key.
	pub fn new(kind: ActionKind, provider: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"marketplace_auth_broker.action",
				action = kind.as_str(),
				provider
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, provider);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedAction<Fut>
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_passes_the_output_through() {
		let span = ActionSpan::new(ActionKind::Refresh, "amazon");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
