//! Demonstrates the decoupled-consent flow: the hook initiates a backchannel request and
//! polls until the (mocked) user approves out-of-band.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::Duration;
// self
use agent_token_hooks::{
	auth::{ProjectId, ScopeSet},
	hooks::{CibaParams, HookBroker, UserIdentity},
	provider::{ClientConfig, ProviderConfig},
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let authorize_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/bc-authorize");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"auth_req_id\":\"demo-req\",\"interval\":0}");
		})
		.await;
	let poll_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/v1/apps/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"consented\",\"token_type\":\"Bearer\",\"expires_in\":600}",
			);
		})
		.await;
	let provider = ProviderConfig::new(ProjectId::new("P2demo")?)
		.with_base_url(Url::parse(&server.base_url())?);
	let client = ClientConfig::new(provider, "demo-client", "demo-secret");
	let consent =
		CibaParams::new("mcp-payments-server", "payments:approve".parse::<ScopeSet>()?)
			.with_binding_message("Approve the pending payment tool call")
			.with_poll_interval(Duration::milliseconds(100))
			.with_timeout(Duration::seconds(10));
	let broker = HookBroker::new();
	let grant = broker
		.ciba_flow(&client, &UserIdentity::LoginHint("user@example.com".into()), &consent)
		.await?;

	println!("User approved; Authorization: {}.", grant.authorization_value());

	authorize_mock.assert_async().await;
	poll_mock.assert_async().await;

	Ok(())
}
