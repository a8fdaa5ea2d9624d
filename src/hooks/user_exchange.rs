//! On-behalf-of exchange of an existing user session token.
//!
//! Single-hop variant of the machine-identity flow: the user's access token is the
//! subject of the exchange and no client secret travels on the call; the provider
//! authorizes the delegation from the subject token itself. Cache entries are
//! disambiguated per user via a token fingerprint, never the token.

// self
use crate::{
	_prelude::*,
	auth::{TokenGrant, TokenSecret},
	cache::CacheKey,
	error::ConfigError,
	hooks::{HookBroker, JsonBody, TokenExchangeParams, common},
	http::TokenHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{GrantType, ProviderConfig, SUBJECT_TOKEN_TYPE_ACCESS_TOKEN},
};

impl<C> HookBroker<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Exchanges a user access token for an audience-scoped resource token.
	pub async fn user_token_exchange(
		&self,
		provider: &ProviderConfig,
		user_token: &TokenSecret,
		exchange: &TokenExchangeParams,
	) -> Result<TokenGrant> {
		const KIND: FlowKind = FlowKind::UserTokenExchange;

		let span = FlowSpan::new(KIND, "user_token_exchange");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if user_token.is_empty() {
					return Err(ConfigError::EmptyUserToken.into());
				}

				exchange.validate()?;

				let key = CacheKey::new(KIND, [
					exchange.audience.clone(),
					exchange.scopes.fingerprint(),
					user_token.fingerprint(),
				]);

				if let Some(cached) = self.cache.fresh(&key, OffsetDateTime::now_utc()) {
					return Ok(cached);
				}

				let body = JsonBody::new()
					.field("grant_type", GrantType::TokenExchange.as_str())
					.field("subject_token", user_token.expose())
					.field("subject_token_type", SUBJECT_TOKEN_TYPE_ACCESS_TOKEN)
					.field("audience", exchange.audience.as_str())
					.opt_field("resource", exchange.resource.as_deref())
					.into_map();
				let exchanged = self
					.send_token_request(provider.token_exchange_endpoint()?, body, None)
					.await?;
				let grant = common::parse_token_grant(exchanged, OffsetDateTime::now_utc())?;

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
