//! Demonstrates the two-hop client-credentials exchange with the default reqwest transport
//! and an isolated in-memory cache, reusing the scoped grant across repeated tool calls.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use agent_token_hooks::{
	auth::{ProjectId, ScopeSet},
	hooks::{HookBroker, TokenExchangeParams},
	provider::{ClientConfig, ProviderConfig},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-agent\",\"token_type\":\"bearer\",\"expires_in\":600}",
			);
		})
		.await;
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/P2demo/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-scoped\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let provider = ProviderConfig::new(ProjectId::new("P2demo")?)
		.with_base_url(Url::parse(&server.base_url())?);
	let client = ClientConfig::new(provider, "demo-client", "demo-secret");
	let exchange =
		TokenExchangeParams::new("mcp-demo-server", "demo:read demo:write".parse::<ScopeSet>()?);
	let broker = HookBroker::new();
	let grant = broker.client_credentials_exchange(&client, &exchange).await?;

	println!("Authorization: {}.", grant.authorization_value());

	// The second acquisition is served from cache; neither endpoint is called again.
	let cached = broker.client_credentials_exchange(&client, &exchange).await?;

	println!("Cached expiry: {}.", cached.expires_at);

	identity_mock.assert_async().await;
	exchange_mock.assert_async().await;

	Ok(())
}
