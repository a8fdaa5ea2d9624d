//! Decoupled user-consent acquisition (client-initiated backchannel authentication).
//!
//! The only strategy with a genuine blocking wait: after initiating a consent request the
//! broker polls the token endpoint until the user approves, the provider reports a
//! terminal error, or the caller's deadline elapses. Poll classification operates on the
//! structured OAuth code parsed from the error body, and every sleep is clamped to the
//! remaining deadline so repeated `slow_down` responses cannot extend the total wait.
//! Dropping the returned future cancels the flow at the next suspend point.
//!
//! Grants obtained through consent are intentionally never cached: each approval
//! authorizes exactly one acquisition.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::time::sleep;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenGrant, TokenSecret},
	error::{ConfigError, ResponseError},
	hooks::{HookBroker, JsonBody, common},
	http::TokenHttpClient,
	obs::{self, CibaPollDisposition, FlowKind, FlowOutcome, FlowSpan},
	provider::{ClientConfig, GrantType},
};

const AUTHORIZATION_PENDING: &str = "authorization_pending";
const SLOW_DOWN: &str = "slow_down";

/// Identifies the user who must approve a backchannel consent request.
///
/// Exactly one identification mode applies per request; the enum makes any other
/// combination unrepresentable.
#[derive(Clone, Debug)]
pub enum UserIdentity {
	/// Identify the user through an existing access token.
	AccessToken(TokenSecret),
	/// Identify the user through a login hint the provider resolves (e.g., an email).
	LoginHint(String),
}
impl UserIdentity {
	fn validate(&self) -> Result<(), ConfigError> {
		match self {
			Self::AccessToken(token) if token.is_empty() => Err(ConfigError::EmptyUserToken),
			Self::LoginHint(hint) if hint.is_empty() => Err(ConfigError::EmptyLoginHint),
			_ => Ok(()),
		}
	}
}

/// Consent parameters and polling pacing for the backchannel flow.
#[derive(Clone, Debug)]
pub struct CibaParams {
	/// Target resource identifier for the granted token.
	pub audience: String,
	/// Scopes requested on the granted token.
	pub scopes: ScopeSet,
	/// Human-readable message shown to the user during consent, binding the approval to
	/// this specific request.
	pub binding_message: Option<String>,
	/// Requested polling interval; the provider's advertised minimum wins when larger.
	pub poll_interval: Duration,
	/// Maximum wall-clock time to wait for the user to approve.
	pub timeout: Duration,
}
impl CibaParams {
	/// Polling interval applied when the caller does not override it.
	pub const DEFAULT_POLL_INTERVAL: Duration = Duration::seconds(2);
	/// Consent deadline applied when the caller does not override it.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(120);

	/// Creates consent parameters for the provided audience and scopes.
	pub fn new(audience: impl Into<String>, scopes: ScopeSet) -> Self {
		Self {
			audience: audience.into(),
			scopes,
			binding_message: None,
			poll_interval: Self::DEFAULT_POLL_INTERVAL,
			timeout: Self::DEFAULT_TIMEOUT,
		}
	}

	/// Attaches a human-readable binding message.
	pub fn with_binding_message(mut self, message: impl Into<String>) -> Self {
		self.binding_message = Some(message.into());

		self
	}

	/// Overrides the requested polling interval.
	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = interval;

		self
	}

	/// Overrides the consent deadline.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.audience.is_empty() {
			return Err(ConfigError::EmptyAudience);
		}
		if self.scopes.is_empty() {
			return Err(ConfigError::EmptyScopes);
		}

		Ok(())
	}
}

impl<C> HookBroker<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Runs the backchannel consent flow to completion.
	pub async fn ciba_flow(
		&self,
		client: &ClientConfig,
		identity: &UserIdentity,
		consent: &CibaParams,
	) -> Result<TokenGrant> {
		const KIND: FlowKind = FlowKind::Ciba;

		let span = FlowSpan::new(KIND, "ciba_flow");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				client.validate()?;
				identity.validate()?;
				consent.validate()?;

				let initiation = self.initiate_consent(client, identity, consent).await?;
				let started = OffsetDateTime::now_utc();
				let deadline = started + consent.timeout;
				let interval = consent.poll_interval.max(initiation.provider_interval);
				let poll_body = JsonBody::new()
					.field("grant_type", GrantType::Ciba.as_str())
					.field("auth_req_id", initiation.auth_req_id.as_str())
					.field("client_id", client.client_id.as_str())
					.field("client_secret", client.client_secret.expose())
					.into_map();
				let token_endpoint = client.provider.token_endpoint()?;

				loop {
					wait_for_next_poll(started, deadline, interval).await?;

					match self
						.send_token_request(token_endpoint.clone(), poll_body.clone(), None)
						.await
					{
						Ok(raw) => {
							obs::record_ciba_poll(CibaPollDisposition::Succeeded);

							return common::parse_token_grant(raw, OffsetDateTime::now_utc());
						},
						Err(Error::Provider(pending))
							if pending.is_code(AUTHORIZATION_PENDING) =>
							obs::record_ciba_poll(CibaPollDisposition::Pending),
						Err(Error::Provider(throttled)) if throttled.is_code(SLOW_DOWN) => {
							obs::record_ciba_poll(CibaPollDisposition::SlowDown);

							// One extra interval this cycle, still clamped to the deadline.
							wait_for_next_poll(started, deadline, interval).await?;
						},
						Err(err) => {
							obs::record_ciba_poll(CibaPollDisposition::Failed);

							return Err(err);
						},
					}
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn initiate_consent(
		&self,
		client: &ClientConfig,
		identity: &UserIdentity,
		consent: &CibaParams,
	) -> Result<ConsentInitiation> {
		let body = JsonBody::new()
			.field("client_id", client.client_id.as_str())
			.field("client_secret", client.client_secret.expose())
			.field("scope", consent.scopes.normalized())
			.field("audience", consent.audience.as_str())
			.opt_field("binding_message", consent.binding_message.as_deref());
		let body = match identity {
			UserIdentity::AccessToken(token) => body.field("login_hint_token", token.expose()),
			UserIdentity::LoginHint(hint) => body.field("login_hint", hint.as_str()),
		};
		let response = self
			.send_token_request(
				client.provider.backchannel_authorize_endpoint()?,
				body.into_map(),
				None,
			)
			.await?;
		let auth_req_id = response
			.get("auth_req_id")
			.and_then(JsonValue::as_str)
			.filter(|id| !id.is_empty())
			.ok_or(ResponseError::MissingAuthReqId)?
			.to_owned();
		let provider_interval = response
			.get("interval")
			.and_then(JsonValue::as_i64)
			.filter(|secs| *secs > 0)
			.map_or(Duration::ZERO, Duration::seconds);

		Ok(ConsentInitiation { auth_req_id, provider_interval })
	}
}

struct ConsentInitiation {
	auth_req_id: String,
	provider_interval: Duration,
}

/// Sleeps one polling interval, clamped to the remaining deadline, and reports
/// [`Error::ConsentTimeout`] once the deadline has passed.
async fn wait_for_next_poll(
	started: OffsetDateTime,
	deadline: OffsetDateTime,
	interval: Duration,
) -> Result<()> {
	let now = OffsetDateTime::now_utc();
	let remaining = deadline - now;

	if !remaining.is_positive() {
		return Err(Error::ConsentTimeout { waited: now - started });
	}

	sleep(std_duration(remaining.min(interval))).await;

	let now = OffsetDateTime::now_utc();

	if now >= deadline {
		return Err(Error::ConsentTimeout { waited: now - started });
	}

	Ok(())
}

fn std_duration(duration: Duration) -> StdDuration {
	StdDuration::try_from(duration).unwrap_or(StdDuration::ZERO)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identity_validation_rejects_empty_values() {
		assert!(UserIdentity::AccessToken(TokenSecret::new("")).validate().is_err());
		assert!(UserIdentity::LoginHint(String::new()).validate().is_err());
		assert!(UserIdentity::LoginHint("user@example.com".into()).validate().is_ok());
		assert!(UserIdentity::AccessToken(TokenSecret::new("jwt")).validate().is_ok());
	}

	#[test]
	fn params_apply_documented_defaults() {
		let scopes = ScopeSet::new(["calendar:read"]).expect("Scope fixture should be valid.");
		let params = CibaParams::new("srv-a", scopes);

		assert_eq!(params.poll_interval, Duration::seconds(2));
		assert_eq!(params.timeout, Duration::seconds(120));
		assert_eq!(params.binding_message, None);
	}

	#[tokio::test]
	async fn waits_clamp_to_the_deadline() {
		let started = OffsetDateTime::now_utc();
		let deadline = started + Duration::milliseconds(50);
		let err = async {
			wait_for_next_poll(started, deadline, Duration::seconds(30)).await?;
			wait_for_next_poll(started, deadline, Duration::seconds(30)).await
		}
		.await
		.expect_err("The clamped wait must trip the deadline, not sleep a full interval.");

		assert!(matches!(err, Error::ConsentTimeout { .. }));
		assert!(
			OffsetDateTime::now_utc() - started < Duration::seconds(5),
			"The wait must be clamped to the remaining deadline."
		);
	}
}
