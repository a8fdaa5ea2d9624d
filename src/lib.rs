//! Pre-tool-use OAuth hooks for autonomous agents—client-credentials exchange, on-behalf-of
//! delegation, outbound connection tokens, and decoupled CIBA consent in one crate.
//!
//! An agent runtime calls [`hooks::HookBroker::pre_tool_use`] (or a bound hook) immediately
//! before invoking a protected tool; the broker selects one of four trust-establishment
//! strategies, consults an expiry-aware cache, performs the provider round trips on a miss,
//! and returns a normalized [`auth::TokenGrant`] ready for `Authorization` header injection.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod error;
pub mod hooks;
pub mod http;
pub mod obs;
pub mod provider;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{cache::TokenCache, hooks::HookBroker, http::ReqwestHttpClient};

	/// Hook broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestHooks = HookBroker<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`HookBroker`] backed by an isolated cache and the reqwest transport used
	/// across integration tests.
	pub fn build_reqwest_test_hooks() -> (ReqwestTestHooks, TokenCache) {
		let cache = TokenCache::default();
		let broker = HookBroker::with_http_client(cache.clone(), test_reqwest_http_client());

		(broker, cache)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::Client as ReqwestClient;
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
