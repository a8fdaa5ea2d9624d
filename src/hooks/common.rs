//! Shared helpers for hook strategies: body construction, request dispatch, and
//! token-response normalization.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenGrant},
	error::{ConfigError, ProviderError, ResponseError},
	hooks::HookBroker,
	http::{JsonRequest, TokenHttpClient},
};

/// Fallback lifetime applied when the provider omits an expiry field.
pub const DEFAULT_EXPIRES_IN: Duration = Duration::seconds(3600);

/// Audience/scope selection shared by the exchange strategies.
#[derive(Clone, Debug)]
pub struct TokenExchangeParams {
	/// Target resource identifier the exchanged token will be scoped to.
	pub audience: String,
	/// Scopes requested on the resource token; part of the cache identity.
	pub scopes: ScopeSet,
	/// Optional RFC 8707 resource indicator.
	pub resource: Option<String>,
}
impl TokenExchangeParams {
	/// Creates exchange parameters for the provided audience and scopes.
	pub fn new(audience: impl Into<String>, scopes: ScopeSet) -> Self {
		Self { audience: audience.into(), scopes, resource: None }
	}

	/// Attaches an RFC 8707 resource indicator.
	pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
		self.resource = Some(resource.into());

		self
	}

	pub(crate) fn validate(&self) -> Result<(), ConfigError> {
		if self.audience.is_empty() {
			return Err(ConfigError::EmptyAudience);
		}
		if self.scopes.is_empty() {
			return Err(ConfigError::EmptyScopes);
		}

		Ok(())
	}
}

/// Accumulates a flat JSON object body, omitting absent optional fields entirely.
///
/// The provider rejects explicit nulls, so optional fields either appear with a value or
/// not at all.
#[derive(Clone, Default)]
pub struct JsonBody(JsonMap<String, JsonValue>);
impl JsonBody {
	/// Creates an empty body.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a required field.
	pub fn field(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
		self.0.insert(key.to_owned(), value.into());

		self
	}

	/// Appends the field only when a value is present.
	pub fn opt_field(self, key: &str, value: Option<impl Into<JsonValue>>) -> Self {
		match value {
			Some(value) => self.field(key, value),
			None => self,
		}
	}

	/// Returns the accumulated object.
	pub fn into_map(self) -> JsonMap<String, JsonValue> {
		self.0
	}
}
impl Debug for JsonBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		// Values may carry secrets; only field names are printed.
		f.debug_tuple("JsonBody").field(&self.0.keys().collect::<Vec<_>>()).finish()
	}
}

impl<C> HookBroker<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// POSTs a JSON body to a provider endpoint and returns the parsed success payload.
	///
	/// Non-success statuses become [`ProviderError`] values carrying the structured OAuth
	/// code parsed from the body; success bodies are deserialized through
	/// `serde_path_to_error` so malformed payloads report the offending path.
	pub(crate) async fn send_token_request(
		&self,
		url: Url,
		body: JsonMap<String, JsonValue>,
		bearer: Option<String>,
	) -> Result<JsonMap<String, JsonValue>> {
		let mut request = JsonRequest::new(url, body);

		if let Some(bearer) = bearer {
			request = request.with_bearer(bearer);
		}

		let response = self.http_client.post_json(request).await.map_err(Error::from)?;

		if !response.is_success() {
			return Err(ProviderError::from_response(response.status, response.body).into());
		}

		let deserializer = &mut serde_json::Deserializer::from_str(&response.body);

		serde_path_to_error::deserialize::<_, JsonMap<String, JsonValue>>(deserializer)
			.map_err(|source| ResponseError::Json { source, status: response.status }.into())
	}
}

/// Normalizes a token endpoint response into a [`TokenGrant`].
///
/// `expires_at` is computed from `received_at`, the instant the response arrived, never the
/// request instant, so a slow round trip cannot inflate the grant's apparent lifetime.
pub(crate) fn parse_token_grant(
	raw: JsonMap<String, JsonValue>,
	received_at: OffsetDateTime,
) -> Result<TokenGrant> {
	let access_token = raw
		.get("access_token")
		.and_then(JsonValue::as_str)
		.filter(|token| !token.is_empty())
		.ok_or(ResponseError::MissingAccessToken)?
		.to_owned();
	let expires_in = expiry_from(&raw, "expires_in")?.unwrap_or(DEFAULT_EXPIRES_IN);
	let token_type = raw.get("token_type").and_then(JsonValue::as_str).map(str::to_owned);
	let scope = raw.get("scope").and_then(JsonValue::as_str).map(str::to_owned);
	let mut builder = TokenGrant::builder()
		.access_token(access_token)
		.issued_at(received_at)
		.expires_in(expires_in)
		.raw(raw);

	if let Some(token_type) = token_type {
		builder = builder.token_type(token_type);
	}
	if let Some(scope) = scope {
		builder = builder.scope(scope);
	}

	builder.build().map_err(|err| ConfigError::from(err).into())
}

/// Reads a relative expiry field in whole seconds, rejecting non-positive and
/// out-of-range values.
pub(crate) fn expiry_from(
	raw: &JsonMap<String, JsonValue>,
	key: &str,
) -> Result<Option<Duration>> {
	let Some(value) = raw.get(key) else {
		return Ok(None);
	};
	let secs = value.as_i64().ok_or(ConfigError::ExpiresInOutOfRange)?;

	if secs <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	Ok(Some(Duration::seconds(secs)))
}
