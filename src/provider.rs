//! Provider configuration, endpoint layout, and grant-type constants.
//!
//! The provider exposes OAuth-shaped endpoints that accept flat JSON bodies. All paths are
//! resolved against a configurable base URL so dedicated and regional deployments work the
//! same way as the public host.

// self
use crate::{
	_prelude::*,
	auth::{ProjectId, TokenSecret},
	error::ConfigError,
};

/// Public SaaS host used when no base URL override is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.descope.com";
/// Subject token type URN presented on token-exchange grants.
pub const SUBJECT_TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";

const TOKEN_PATH: &str = "/oauth2/v1/apps/token";
const BACKCHANNEL_AUTHORIZE_PATH: &str = "/oauth2/v1/apps/bc-authorize";
const CONNECTIONS_PATH: &str = "/v1/mgmt/outbound/app/user/token";

/// Grant types issued against the provider's token endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantType {
	/// Machine-identity `client_credentials` grant.
	ClientCredentials,
	/// RFC 8693 token exchange.
	TokenExchange,
	/// OpenID client-initiated backchannel authentication.
	Ciba,
}
impl GrantType {
	/// Returns the wire value for the `grant_type` field.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::ClientCredentials => "client_credentials",
			GrantType::TokenExchange => "urn:ietf:params:oauth:grant-type:token-exchange",
			GrantType::Ciba => "urn:openid:params:grant-type:ciba",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Immutable provider configuration consumed by every hook strategy.
///
/// Constructed once by the caller and passed by reference into each call; the broker
/// itself holds no provider state, so one broker can serve any number of projects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
	/// Project identifier acting as the OAuth issuer namespace.
	pub project_id: ProjectId,
	/// Base URL override for dedicated or regional deployments.
	pub base_url: Option<Url>,
}
impl ProviderConfig {
	/// Creates a configuration pointing at the public host.
	pub fn new(project_id: ProjectId) -> Self {
		Self { project_id, base_url: None }
	}

	/// Overrides the base URL for dedicated or regional deployments.
	pub fn with_base_url(mut self, base_url: Url) -> Self {
		self.base_url = Some(base_url);

		self
	}

	/// Shared token endpoint serving the client-credentials grant and CIBA polling.
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		self.join(TOKEN_PATH)
	}

	/// Project-scoped token-exchange endpoint.
	pub fn token_exchange_endpoint(&self) -> Result<Url, ConfigError> {
		self.join(&format!("/oauth2/v1/apps/{}/token", self.project_id))
	}

	/// Backchannel authorization endpoint used to initiate decoupled consent.
	pub fn backchannel_authorize_endpoint(&self) -> Result<Url, ConfigError> {
		self.join(BACKCHANNEL_AUTHORIZE_PATH)
	}

	/// Management endpoint returning outbound connection tokens.
	pub fn connections_endpoint(&self) -> Result<Url, ConfigError> {
		self.join(CONNECTIONS_PATH)
	}

	/// Composite bearer credential accepted by the management API.
	pub fn management_bearer(&self, user_token: &TokenSecret) -> String {
		format!("{}:{}", self.project_id, user_token.expose())
	}

	// Plain concatenation keeps path-prefixed base URLs intact, which `Url::join` with an
	// absolute path would silently drop.
	fn join(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_ref().map_or(DEFAULT_BASE_URL, Url::as_str);
		let raw = format!("{}{path}", base.trim_end_matches('/'));

		Url::parse(&raw).map_err(|source| ConfigError::InvalidEndpoint { source })
	}
}

/// Machine identity used by the confidential flows (client credentials and CIBA).
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Provider configuration the identity belongs to.
	pub provider: ProviderConfig,
	/// OAuth client identifier.
	pub client_id: String,
	/// Client secret; redacted in debug output and never stored alongside cached grants.
	pub client_secret: TokenSecret,
}
impl ClientConfig {
	/// Creates a machine identity for the provided project.
	pub fn new(
		provider: ProviderConfig,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self {
			provider,
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
		}
	}

	pub(crate) fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.is_empty() {
			return Err(ConfigError::EmptyClientId);
		}
		if self.client_secret.is_empty() {
			return Err(ConfigError::EmptyClientSecret);
		}

		Ok(())
	}
}
