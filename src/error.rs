//! Hook-level error types shared across strategies, transport, and cache consumers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical hook error exposed by public APIs.
///
/// Strategies never catch-and-swallow: every failure propagates to the caller with enough
/// detail (status, structured OAuth code, raw body) to decide whether to retry the tool
/// call, fall back to another strategy, or surface a denial.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; surfaced before any network call, never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Provider endpoint returned a non-success HTTP status.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// Provider response was missing expected fields or failed to parse.
	#[error(transparent)]
	Response(#[from] ResponseError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Decoupled-consent deadline elapsed while the authorization was still pending.
	#[error("Backchannel consent was still pending after {waited}.")]
	ConsentTimeout {
		/// Total wall-clock time spent waiting for consent.
		waited: Duration,
	},
}
impl Error {
	/// Returns the structured OAuth error code when the failure came from the provider.
	pub fn oauth_code(&self) -> Option<&str> {
		match self {
			Self::Provider(provider) => provider.code.as_deref(),
			_ => None,
		}
	}
}

/// Non-success response returned by a provider endpoint.
///
/// The raw body is always preserved (provider codes such as `authorization_pending` ride in
/// it) and the OAuth `error`/`error_description` fields are parsed out so callers branch on
/// structured codes instead of matching message substrings.
#[derive(Clone, Debug, ThisError)]
#[error("Provider returned HTTP {status}: {body}")]
pub struct ProviderError {
	/// HTTP status code returned by the endpoint.
	pub status: u16,
	/// OAuth `error` code parsed from the JSON body, when present.
	pub code: Option<String>,
	/// OAuth `error_description` field, when present.
	pub description: Option<String>,
	/// Raw response body text, preserved verbatim.
	pub body: String,
}
impl ProviderError {
	/// Builds a provider error from a response status and raw body, parsing the OAuth error
	/// fields when the body is JSON.
	pub fn from_response(status: u16, body: String) -> Self {
		let (code, description) = match serde_json::from_str::<JsonValue>(&body) {
			Ok(json) => (
				json.get("error").and_then(JsonValue::as_str).map(str::to_owned),
				json.get("error_description").and_then(JsonValue::as_str).map(str::to_owned),
			),
			Err(_) => (None, None),
		};

		Self { status, code, description, body }
	}

	/// Returns `true` when the provider signaled the given OAuth error code.
	pub fn is_code(&self, code: &str) -> bool {
		self.code.as_deref() == Some(code)
	}
}

/// Configuration and validation failures raised before any provider call.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Audience identifier was empty.
	#[error("Audience cannot be empty.")]
	EmptyAudience,
	/// Client identifier was empty.
	#[error("Client identifier cannot be empty.")]
	EmptyClientId,
	/// Client secret was empty.
	#[error("Client secret cannot be empty.")]
	EmptyClientSecret,
	/// Login hint was empty.
	#[error("Login hint cannot be empty.")]
	EmptyLoginHint,
	/// Scope set was empty where the provider requires at least one scope.
	#[error("At least one scope is required.")]
	EmptyScopes,
	/// User access token was empty.
	#[error("User access token cannot be empty.")]
	EmptyUserToken,
	/// An endpoint URL could not be constructed from the base URL.
	#[error("Endpoint URL could not be constructed.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Identifier validation failed.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Token grant builder validation failed.
	#[error("Unable to build token grant.")]
	TokenBuild(#[from] crate::auth::TokenGrantBuilderError),
	/// Provider returned a non-positive `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Provider returned an `expires_in` outside the supported range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}

/// Malformed or incomplete provider responses.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Response body was not valid JSON for the expected shape.
	#[error("Provider returned malformed JSON.")]
	Json {
		/// Structured parsing failure carrying the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token response carried none of the recognized access token fields.
	#[error("Provider response is missing an access token field.")]
	MissingAccessToken,
	/// Backchannel authorization response did not include an `auth_req_id`.
	#[error("Backchannel authorization response is missing auth_req_id.")]
	MissingAuthReqId,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
	fn from(e: reqwest::Error) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn provider_error_parses_structured_oauth_fields() {
		let err = ProviderError::from_response(
			400,
			"{\"error\":\"authorization_pending\",\"error_description\":\"User has not approved yet\"}"
				.into(),
		);

		assert_eq!(err.status, 400);
		assert!(err.is_code("authorization_pending"));
		assert_eq!(err.description.as_deref(), Some("User has not approved yet"));
		assert!(err.body.contains("authorization_pending"));
	}

	#[test]
	fn provider_error_preserves_non_json_bodies() {
		let err = ProviderError::from_response(502, "upstream unavailable".into());

		assert_eq!(err.status, 502);
		assert_eq!(err.code, None);
		assert_eq!(err.body, "upstream unavailable");
		assert!(!err.is_code("slow_down"));
	}

	#[test]
	fn oauth_code_surfaces_through_the_top_level_error() {
		let err = Error::from(ProviderError::from_response(400, "{\"error\":\"slow_down\"}".into()));

		assert_eq!(err.oauth_code(), Some("slow_down"));
		assert_eq!(Error::from(ConfigError::EmptyAudience).oauth_code(), None);
	}
}
