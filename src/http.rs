//! Transport primitives for provider token endpoints.
//!
//! The module exposes [`TokenHttpClient`] so downstream crates can integrate custom HTTP
//! stacks. Implementations issue a single JSON POST per call and report the raw status and
//! body text verbatim; they never interpret statuses and never retry. Classification of
//! non-success responses and retry policy belong to the strategies (notably the
//! decoupled-consent poll loop).

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`TokenHttpClient::post_json`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Single JSON POST request against a provider endpoint.
///
/// Bodies are flat JSON objects with absent optional fields omitted entirely, never
/// serialized as null; strategies enforce that invariant before the request reaches the
/// transport.
#[derive(Clone)]
pub struct JsonRequest {
	/// Target endpoint URL.
	pub url: Url,
	/// JSON object body.
	pub body: JsonMap<String, JsonValue>,
	/// Bearer credential for the `Authorization` header, when the endpoint requires one.
	pub bearer: Option<String>,
}
impl JsonRequest {
	/// Creates a request with no `Authorization` header.
	pub fn new(url: Url, body: JsonMap<String, JsonValue>) -> Self {
		Self { url, body, bearer: None }
	}

	/// Attaches a bearer credential.
	pub fn with_bearer(mut self, bearer: impl Into<String>) -> Self {
		self.bearer = Some(bearer.into());

		self
	}
}
impl Debug for JsonRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		// Bodies and bearer credentials carry secrets; only shape information is printed.
		f.debug_struct("JsonRequest")
			.field("url", &self.url.as_str())
			.field("body_fields", &self.body.keys().collect::<Vec<_>>())
			.field("bearer_set", &self.bearer.is_some())
			.finish()
	}
}

/// Raw response captured by a transport implementation.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body text, preserved verbatim for error diagnostics.
	pub body: String,
}
impl RawResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports capable of executing provider token calls.
///
/// The trait is the crate's only dependency on an HTTP stack. It is object safe, so hook
/// brokers can hold `Arc<dyn TokenHttpClient>` or stay generic over a concrete transport.
/// Implementations must be `Send + Sync + 'static` and the returned futures must be `Send`
/// so hook calls can hop executors.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Serializes `request.body`, POSTs it, and resolves to the raw status + body.
	///
	/// Only transport-level failures (DNS, TCP, TLS, IO) are errors here; a non-success
	/// HTTP status is a successful transport outcome carried in [`RawResponse`].
	fn post_json(&self, request: JsonRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that token
/// endpoints return results directly instead of delegating to another URI. Configure any
/// custom [`ReqwestClient`] accordingly before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	fn post_json(&self, request: JsonRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.post(request.url).json(&request.body);

			if let Some(bearer) = &request.bearer {
				builder = builder.bearer_auth(bearer);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.text().await.map_err(TransportError::from)?;

			Ok(RawResponse { status, body })
		})
	}
}
