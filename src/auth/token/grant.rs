//! Issued token grant model, lifecycle helpers, and builder.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Token type applied when the provider omits `token_type`.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Errors produced by [`TokenGrantBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenGrantBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Immutable result of a successful token acquisition.
///
/// `expires_at` is always an absolute instant computed when the provider response was
/// received, never a TTL, so cache consumers never need the original request time.
#[derive(Clone)]
pub struct TokenGrant {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Token type echoed by the provider, `Bearer` unless overridden.
	pub token_type: String,
	/// Instant the grant was received from the provider.
	pub issued_at: OffsetDateTime,
	/// Absolute expiry instant derived from the provider's relative `expires_in`.
	pub expires_at: OffsetDateTime,
	/// Scope string echoed by the provider, if any.
	pub scope: Option<String>,
	/// Full provider response kept for diagnostics; may embed sensitive values.
	pub raw: JsonMap<String, JsonValue>,
}
impl TokenGrant {
	/// Returns a builder for constructing grants.
	pub fn builder() -> TokenGrantBuilder {
		TokenGrantBuilder::default()
	}

	/// Remaining validity at the provided instant; negative once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}

	/// Returns `true` when strictly more than `margin` of validity remains at `instant`.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		self.remaining_at(instant) > margin
	}

	/// Value suitable for an `Authorization` header, e.g. `Bearer <token>`.
	pub fn authorization_value(&self) -> String {
		format!("{} {}", self.token_type, self.access_token.expose())
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("scope", &self.scope)
			.field("raw", &"<redacted>")
			.finish()
	}
}

/// Builder for [`TokenGrant`].
#[derive(Clone, Debug, Default)]
pub struct TokenGrantBuilder {
	access_token: Option<TokenSecret>,
	token_type: Option<String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	scope: Option<String>,
	raw: Option<JsonMap<String, JsonValue>>,
}
impl TokenGrantBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the default `Bearer` token type.
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the instant the provider response was received.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Records the scope string echoed by the provider.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Attaches the full provider response for diagnostics.
	pub fn raw(mut self, raw: JsonMap<String, JsonValue>) -> Self {
		self.raw = Some(raw);

		self
	}

	/// Consumes the builder and produces a [`TokenGrant`].
	pub fn build(self) -> Result<TokenGrant, TokenGrantBuilderError> {
		let access_token = self.access_token.ok_or(TokenGrantBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(TokenGrantBuilderError::MissingExpiry),
		};

		Ok(TokenGrant {
			access_token,
			token_type: self.token_type.unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned()),
			issued_at,
			expires_at,
			scope: self.scope,
			raw: self.raw.unwrap_or_default(),
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn builder_computes_absolute_expiry_from_receipt_instant() {
		let received = macros::datetime!(2025-06-01 12:00 UTC);
		let grant = TokenGrant::builder()
			.access_token("AT1")
			.issued_at(received)
			.expires_in(Duration::seconds(3600))
			.build()
			.expect("Grant builder should support relative expiry.");

		assert_eq!(grant.expires_at, macros::datetime!(2025-06-01 13:00 UTC));
		assert_eq!(grant.token_type, DEFAULT_TOKEN_TYPE);
	}

	#[test]
	fn builder_requires_token_and_expiry() {
		let err = TokenGrant::builder()
			.expires_in(Duration::seconds(60))
			.build()
			.expect_err("Missing access token must be rejected.");

		assert_eq!(err, TokenGrantBuilderError::MissingAccessToken);

		let err = TokenGrant::builder()
			.access_token("AT1")
			.build()
			.expect_err("Missing expiry must be rejected.");

		assert_eq!(err, TokenGrantBuilderError::MissingExpiry);
	}

	#[test]
	fn freshness_helpers_honor_the_margin() {
		let issued = macros::datetime!(2025-06-01 12:00 UTC);
		let grant = TokenGrant::builder()
			.access_token("AT1")
			.issued_at(issued)
			.expires_in(Duration::seconds(100))
			.build()
			.expect("Grant builder should succeed for freshness helpers.");
		let margin = Duration::seconds(30);

		assert!(grant.is_fresh_at(issued, margin));
		assert!(!grant.is_fresh_at(issued + Duration::seconds(70), margin), "Exactly the margin remaining is not fresh.");
		assert!(!grant.is_fresh_at(issued + Duration::seconds(120), margin));
		assert_eq!(grant.remaining_at(issued + Duration::seconds(40)), Duration::seconds(60));
	}

	#[test]
	fn debug_and_header_value_behave() {
		let grant = TokenGrant::builder()
			.access_token("very-secret")
			.token_type("DPoP")
			.expires_in(Duration::seconds(60))
			.build()
			.expect("Grant builder should succeed for formatting checks.");

		assert_eq!(grant.authorization_value(), "DPoP very-secret");
		assert!(!format!("{grant:?}").contains("very-secret"), "Debug output must redact the token.");
	}
}
