//! Demonstrates the unified dispatcher: an agent runtime binds one strategy descriptor and
//! then acquires a fresh grant before every tool invocation with no arguments.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use agent_token_hooks::{
	auth::{ProjectId, ScopeSet, TokenSecret},
	hooks::{HookBroker, HookStrategy, TokenExchangeParams},
	provider::ProviderConfig,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/P2demo/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"delegated\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let provider = ProviderConfig::new(ProjectId::new("P2demo")?)
		.with_base_url(Url::parse(&server.base_url())?);
	let broker = HookBroker::new();
	let hook = broker.bind(HookStrategy::UserTokenExchange {
		provider,
		user_token: TokenSecret::new("user-session-jwt"),
		exchange: TokenExchangeParams::new(
			"mcp-github-server",
			"repo:read issues:write".parse::<ScopeSet>()?,
		),
	});

	for tool_call in 1..=3 {
		let grant = hook.acquire().await?;

		println!("Tool call {tool_call} -> Authorization: {}.", grant.authorization_value());
	}

	// Three tool calls, one provider round trip; the rest were cache hits.
	exchange_mock.assert_calls_async(1).await;

	Ok(())
}
