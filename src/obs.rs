//! Optional observability helpers for hook flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `agent_token_hooks.flow` with the
//!   `flow` (strategy) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `agent_token_hooks_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and the
//!   `agent_token_hooks_ciba_poll_total` counter labeled by poll `disposition`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Credential-acquisition strategies observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Two-hop client-credentials + token-exchange flow.
	ClientCredentialsExchange,
	/// On-behalf-of exchange of a user session token.
	UserTokenExchange,
	/// Outbound connection token retrieval.
	Connections,
	/// Decoupled backchannel consent flow.
	Ciba,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::ClientCredentialsExchange => "client_credentials_exchange",
			FlowKind::UserTokenExchange => "user_token_exchange",
			FlowKind::Connections => "connections",
			FlowKind::Ciba => "ciba",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker strategy.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Poll dispositions recorded by the decoupled-consent loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CibaPollDisposition {
	/// Authorization still pending; the loop keeps waiting.
	Pending,
	/// Provider asked the loop to back off for a cycle.
	SlowDown,
	/// Poll returned a granted token.
	Succeeded,
	/// Poll failed with a terminal error.
	Failed,
}
impl CibaPollDisposition {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CibaPollDisposition::Pending => "pending",
			CibaPollDisposition::SlowDown => "slow_down",
			CibaPollDisposition::Succeeded => "succeeded",
			CibaPollDisposition::Failed => "failed",
		}
	}
}
impl Display for CibaPollDisposition {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
