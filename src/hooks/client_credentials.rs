//! Two-hop machine-identity acquisition: client-credentials grant, then token exchange.
//!
//! [`HookBroker::client_credentials_exchange`] resolves an agent-identity token via the
//! `client_credentials` grant and immediately exchanges it for a token scoped to the
//! requested audience at the project-scoped exchange endpoint. Results are cached per
//! (client, audience, scope) tuple: a hit performs zero network round trips, a miss
//! exactly two. Neither hop is retried; the caller decides whether to retry the tool
//! invocation.

// self
use crate::{
	_prelude::*,
	auth::TokenGrant,
	cache::CacheKey,
	hooks::{HookBroker, JsonBody, TokenExchangeParams, common},
	http::TokenHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{ClientConfig, GrantType, SUBJECT_TOKEN_TYPE_ACCESS_TOKEN},
};

impl<C> HookBroker<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Performs the two-hop client-credentials exchange with caching.
	pub async fn client_credentials_exchange(
		&self,
		client: &ClientConfig,
		exchange: &TokenExchangeParams,
	) -> Result<TokenGrant> {
		const KIND: FlowKind = FlowKind::ClientCredentialsExchange;

		let span = FlowSpan::new(KIND, "client_credentials_exchange");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				client.validate()?;
				exchange.validate()?;

				let key = CacheKey::new(KIND, [
					client.client_id.clone(),
					exchange.audience.clone(),
					exchange.scopes.fingerprint(),
				]);

				if let Some(cached) = self.cache.fresh(&key, OffsetDateTime::now_utc()) {
					return Ok(cached);
				}

				// Hop 1: agent-identity token via the shared token endpoint.
				let identity_body = JsonBody::new()
					.field("grant_type", GrantType::ClientCredentials.as_str())
					.field("client_id", client.client_id.as_str())
					.field("client_secret", client.client_secret.expose())
					.into_map();
				let identity = self
					.send_token_request(client.provider.token_endpoint()?, identity_body, None)
					.await?;
				let identity_grant =
					common::parse_token_grant(identity, OffsetDateTime::now_utc())?;

				// Hop 2: audience-scoped token via the project-scoped exchange endpoint,
				// presenting the hop-1 token as the subject.
				let exchange_body = JsonBody::new()
					.field("grant_type", GrantType::TokenExchange.as_str())
					.field("client_id", client.client_id.as_str())
					.field("client_secret", client.client_secret.expose())
					.field("subject_token", identity_grant.access_token.expose())
					.field("subject_token_type", SUBJECT_TOKEN_TYPE_ACCESS_TOKEN)
					.field("audience", exchange.audience.as_str())
					.opt_field("resource", exchange.resource.as_deref())
					.into_map();
				let exchanged = self
					.send_token_request(
						client.provider.token_exchange_endpoint()?,
						exchange_body,
						None,
					)
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
