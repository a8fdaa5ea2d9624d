// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use agent_token_hooks::{
	auth::{ProjectId, ScopeSet},
	error::Error,
	hooks::{HookBroker, TokenExchangeParams},
	provider::{ClientConfig, ProviderConfig},
	url::Url,
};

const CLIENT_ID: &str = "DS_client";
const CLIENT_SECRET: &str = "ds_secret";

fn provider(server: &MockServer) -> ProviderConfig {
	ProviderConfig::new(ProjectId::new("P2test").expect("Project identifier should be valid."))
		.with_base_url(
			Url::parse(&server.base_url()).expect("Mock base URL should parse successfully."),
		)
}

fn client(server: &MockServer) -> ClientConfig {
	ClientConfig::new(provider(server), CLIENT_ID, CLIENT_SECRET)
}

fn exchange_params(audience: &str, scopes: &str) -> TokenExchangeParams {
	TokenExchangeParams::new(
		audience,
		scopes.parse::<ScopeSet>().expect("Scope fixture should parse successfully."),
	)
}

#[tokio::test]
async fn two_hops_produce_an_audience_scoped_grant() {
	let server = MockServer::start_async().await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"AGENT_TOKEN\",\"token_type\":\"bearer\",\"expires_in\":600}",
			);
		})
		.await;
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/P2test/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"AT1\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let broker = HookBroker::new();
	let grant = broker
		.client_credentials_exchange(&client(&server), &exchange_params("srv-a", "read write"))
		.await
		.expect("Two-hop exchange should succeed against the mock provider.");

	assert_eq!(grant.access_token.expose(), "AT1");
	assert_eq!(grant.token_type, "Bearer");

	let remaining = grant.expires_at - OffsetDateTime::now_utc();

	assert!(
		remaining > Duration::seconds(3500) && remaining <= Duration::seconds(3600),
		"Expiry must be absolute: receipt time plus expires_in.",
	);

	identity_mock.assert_async().await;
	exchange_mock.assert_async().await;
}

#[tokio::test]
async fn cache_hit_skips_both_hops() {
	let server = MockServer::start_async().await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"AGENT_TOKEN\",\"token_type\":\"bearer\",\"expires_in\":600}",
			);
		})
		.await;
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/P2test/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"CACHED\",\"token_type\":\"Bearer\",\"expires_in\":1800}",
			);
		})
		.await;
	let broker = HookBroker::new();
	let cfg = client(&server);
	let params = exchange_params("srv-b", "read");
	let first = broker
		.client_credentials_exchange(&cfg, &params)
		.await
		.expect("Initial exchange should succeed.");
	let second = broker
		.client_credentials_exchange(&cfg, &params)
		.await
		.expect("Cached exchange should succeed without network calls.");

	assert_eq!(first.access_token.expose(), "CACHED");
	assert_eq!(second.access_token.expose(), "CACHED");
	assert_eq!(first.expires_at, second.expires_at, "The cached grant is returned unchanged.");

	identity_mock.assert_calls_async(1).await;
	exchange_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn distinct_audiences_do_not_share_cache_entries() {
	let server = MockServer::start_async().await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"AGENT_TOKEN\",\"token_type\":\"bearer\",\"expires_in\":600}",
			);
		})
		.await;
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/P2test/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"AT\",\"token_type\":\"Bearer\",\"expires_in\":1800}",
			);
		})
		.await;
	let broker = HookBroker::new();
	let cfg = client(&server);

	broker
		.client_credentials_exchange(&cfg, &exchange_params("srv-a", "read"))
		.await
		.expect("First audience should succeed.");
	broker
		.client_credentials_exchange(&cfg, &exchange_params("srv-b", "read"))
		.await
		.expect("Second audience should succeed.");

	identity_mock.assert_calls_async(2).await;
	exchange_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn identity_hop_rejection_fails_the_whole_call() {
	let server = MockServer::start_async().await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\",\"error_description\":\"Unknown client\"}");
		})
		.await;
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/P2test/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"NEVER\",\"token_type\":\"Bearer\",\"expires_in\":1800}",
			);
		})
		.await;
	let broker = HookBroker::new();
	let err = broker
		.client_credentials_exchange(&client(&server), &exchange_params("srv-a", "read"))
		.await
		.expect_err("Provider rejection must propagate to the caller.");

	assert_eq!(err.oauth_code(), Some("invalid_client"));

	match err {
		Error::Provider(provider) => {
			assert_eq!(provider.status, 401);
			assert!(provider.body.contains("Unknown client"), "Raw body must be preserved.");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	identity_mock.assert_async().await;
	exchange_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn empty_audience_is_rejected_before_any_network_call() {
	let server = MockServer::start_async().await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"AGENT_TOKEN\",\"token_type\":\"bearer\",\"expires_in\":600}",
			);
		})
		.await;
	let broker = HookBroker::new();
	let err = broker
		.client_credentials_exchange(&client(&server), &exchange_params("", "read"))
		.await
		.expect_err("Empty audience must be rejected.");

	assert!(matches!(err, Error::Config(_)));

	identity_mock.assert_calls_async(0).await;
}
