// self
use crate::obs::{CibaPollDisposition, FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"agent_token_hooks_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records one backchannel poll attempt and its disposition (when enabled).
pub fn record_ciba_poll(disposition: CibaPollDisposition) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"agent_token_hooks_ciba_poll_total",
			"disposition" => disposition.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = disposition;
	}
}
