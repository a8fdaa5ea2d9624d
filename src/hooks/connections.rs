//! Raw third-party token retrieval for a user's stored outbound connection.
//!
//! Unlike the exchange strategies, the credential returned here is the third-party
//! provider's own token (GitHub, Google, ...), released from provider custody to the
//! caller. It may be long-lived and is not audience-scoped by this library's provider.
//! Callers must never log it, must not persist it beyond the immediate tool call, and
//! should prefer [`HookBroker::client_credentials_exchange`] or
//! [`HookBroker::user_token_exchange`] whenever the downstream resource accepts a
//! provider-issued resource token instead.
//!
//! The management API's response shape is loosely typed across deployments. The token
//! field may be `token`, `accessToken`, or `access_token` and the expiry `expiresIn` or
//! `expires_in`, so normalization accepts every variant rather than assuming one.

// crates.io
use serde_json::json;
// self
use crate::{
	_prelude::*,
	auth::{AppId, TenantId, TokenGrant, TokenSecret, UserId},
	cache::CacheKey,
	error::{ConfigError, ResponseError},
	hooks::{HookBroker, JsonBody, common},
	http::TokenHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderConfig,
};

const TOKEN_FIELDS: [&str; 3] = ["token", "accessToken", "access_token"];
const EXPIRY_FIELDS: [&str; 2] = ["expiresIn", "expires_in"];

/// Options forwarded to the management API when retrieving a connection token.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectionOptions {
	/// Requests a refresh token alongside the access token.
	pub with_refresh_token: bool,
	/// Forces the provider to mint a fresh token even when one is stored.
	pub force_refresh: bool,
}

/// Selects the outbound connection to retrieve a token for.
#[derive(Clone, Debug)]
pub struct ConnectionsParams {
	/// Outbound app identifier (e.g., `github`).
	pub app_id: AppId,
	/// User the stored connection belongs to.
	pub user_id: UserId,
	/// Tenant qualifier when the user belongs to a specific tenant.
	pub tenant_id: Option<TenantId>,
	/// Scopes to request on the connection token.
	pub scopes: Option<Vec<String>>,
	/// Additional retrieval options.
	pub options: Option<ConnectionOptions>,
}
impl ConnectionsParams {
	/// Creates parameters for the provided app and user.
	pub fn new(app_id: AppId, user_id: UserId) -> Self {
		Self { app_id, user_id, tenant_id: None, scopes: None, options: None }
	}

	/// Qualifies the lookup with a tenant.
	pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
		self.tenant_id = Some(tenant_id);

		self
	}

	/// Requests specific scopes on the connection token.
	pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.scopes = Some(scopes.into_iter().map(Into::into).collect());

		self
	}

	/// Attaches retrieval options.
	pub fn with_options(mut self, options: ConnectionOptions) -> Self {
		self.options = Some(options);

		self
	}
}

impl<C> HookBroker<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Retrieves the raw third-party token for a user's stored outbound connection.
	pub async fn user_connections_token(
		&self,
		provider: &ProviderConfig,
		user_token: &TokenSecret,
		connection: &ConnectionsParams,
	) -> Result<TokenGrant> {
		const KIND: FlowKind = FlowKind::Connections;

		let span = FlowSpan::new(KIND, "user_connections_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if user_token.is_empty() {
					return Err(ConfigError::EmptyUserToken.into());
				}

				let key = CacheKey::new(KIND, [
					connection.app_id.to_string(),
					connection.user_id.to_string(),
					user_token.fingerprint(),
				]);

				if let Some(cached) = self.cache.fresh(&key, OffsetDateTime::now_utc()) {
					return Ok(cached);
				}

				let body = JsonBody::new()
					.field("appId", connection.app_id.as_ref())
					.field("userId", connection.user_id.as_ref())
					.opt_field("tenantId", connection.tenant_id.as_deref())
					.opt_field("scopes", connection.scopes.clone())
					.opt_field(
						"options",
						connection.options.map(|options| {
							json!({
								"withRefreshToken": options.with_refresh_token,
								"forceRefresh": options.force_refresh,
							})
						}),
					)
					.into_map();
				let raw = self
					.send_token_request(
						provider.connections_endpoint()?,
						body,
						Some(provider.management_bearer(user_token)),
					)
					.await?;
				let grant = normalize_connection_response(raw, OffsetDateTime::now_utc())?;

				Ok(self.cache.store(key, grant))
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

fn normalize_connection_response(
	raw: JsonMap<String, JsonValue>,
	received_at: OffsetDateTime,
) -> Result<TokenGrant> {
	let token = TOKEN_FIELDS
		.iter()
		.find_map(|field| raw.get(*field).and_then(JsonValue::as_str))
		.filter(|token| !token.is_empty())
		.ok_or(ResponseError::MissingAccessToken)?
		.to_owned();
	let mut expires_in = None;

	for field in EXPIRY_FIELDS {
		if let Some(duration) = common::expiry_from(&raw, field)? {
			expires_in = Some(duration);

			break;
		}
	}

	TokenGrant::builder()
		.access_token(token)
		.issued_at(received_at)
		.expires_in(expires_in.unwrap_or(common::DEFAULT_EXPIRES_IN))
		.raw(raw)
		.build()
		.map_err(|err| ConfigError::from(err).into())
}
