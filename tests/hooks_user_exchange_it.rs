// crates.io
use httpmock::prelude::*;
// self
use agent_token_hooks::{
	auth::{ProjectId, ScopeSet, TokenSecret},
	error::Error,
	hooks::{HookBroker, TokenExchangeParams},
	provider::ProviderConfig,
	url::Url,
};

fn provider(server: &MockServer) -> ProviderConfig {
	ProviderConfig::new(ProjectId::new("P2test").expect("Project identifier should be valid."))
		.with_base_url(
			Url::parse(&server.base_url()).expect("Mock base URL should parse successfully."),
		)
}

fn exchange_params(audience: &str, scopes: &str) -> TokenExchangeParams {
	TokenExchangeParams::new(
		audience,
		scopes.parse::<ScopeSet>().expect("Scope fixture should parse successfully."),
	)
}

#[tokio::test]
async fn user_exchange_is_single_hop_and_cached() {
	let server = MockServer::start_async().await;
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/P2test/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"USER_SCOPED\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let broker = HookBroker::new();
	let cfg = provider(&server);
	let session = TokenSecret::new("user-session-jwt");
	let params = exchange_params("mcp-github-server", "repo:read repo:write");
	let first = broker
		.user_token_exchange(&cfg, &session, &params)
		.await
		.expect("On-behalf-of exchange should succeed against the mock provider.");
	let second = broker
		.user_token_exchange(&cfg, &session, &params)
		.await
		.expect("Repeated exchange should be served from cache.");

	assert_eq!(first.access_token.expose(), "USER_SCOPED");
	assert_eq!(second.access_token.expose(), "USER_SCOPED");
	assert_eq!(first.expires_at, second.expires_at);

	exchange_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn distinct_user_tokens_never_share_grants() {
	let server = MockServer::start_async().await;
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/P2test/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"PER_USER\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let broker = HookBroker::new();
	let cfg = provider(&server);
	let params = exchange_params("mcp-github-server", "repo:read");

	broker
		.user_token_exchange(&cfg, &TokenSecret::new("alice-session"), &params)
		.await
		.expect("First user's exchange should succeed.");
	broker
		.user_token_exchange(&cfg, &TokenSecret::new("bob-session"), &params)
		.await
		.expect("Second user's exchange should succeed.");

	exchange_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn empty_user_token_is_rejected_before_any_network_call() {
	let server = MockServer::start_async().await;
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/P2test/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"NEVER\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let broker = HookBroker::new();
	let err = broker
		.user_token_exchange(
			&provider(&server),
			&TokenSecret::new(""),
			&exchange_params("mcp-github-server", "repo:read"),
		)
		.await
		.expect_err("Empty user token must be rejected.");

	assert!(matches!(err, Error::Config(_)));

	exchange_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn provider_rejection_surfaces_the_structured_code() {
	let server = MockServer::start_async().await;
	let _exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/P2test/token");
			then.status(403)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Session expired\"}");
		})
		.await;
	let broker = HookBroker::new();
	let err = broker
		.user_token_exchange(
			&provider(&server),
			&TokenSecret::new("stale-session"),
			&exchange_params("mcp-github-server", "repo:read"),
		)
		.await
		.expect_err("Provider rejection must propagate.");

	assert_eq!(err.oauth_code(), Some("invalid_grant"));
}
