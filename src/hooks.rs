//! Pre-tool-use hook strategies and the unified dispatcher.
//!
//! Each strategy is a method on [`HookBroker`]; [`HookBroker::pre_tool_use`] routes a
//! [`HookStrategy`] descriptor to the matching method, and [`HookBroker::bind`] curries a
//! descriptor into a zero-argument hook for repeated tool invocations.

pub mod ciba;
pub mod common;
pub mod connections;

mod client_credentials;
mod user_exchange;

pub use ciba::*;
pub use common::*;
pub use connections::*;

// self
use crate::{
	_prelude::*,
	auth::{TokenGrant, TokenSecret},
	cache::TokenCache,
	http::TokenHttpClient,
	provider::{ClientConfig, ProviderConfig},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Hook broker specialized for the crate's default reqwest transport.
pub type ReqwestHookBroker = HookBroker<ReqwestHttpClient>;

/// Coordinates the four credential-acquisition strategies against one cache and one
/// transport.
///
/// The broker owns the HTTP client and grant cache so strategy implementations can focus
/// on protocol logic. Provider and identity configuration travels with each call; the
/// broker itself is identity-free and can serve any number of projects.
pub struct HookBroker<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// HTTP client used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Expiry-aware grant cache shared by all strategies.
	pub cache: TokenCache,
}
impl<C> HookBroker<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a broker that reuses the caller-provided transport and cache.
	pub fn with_http_client(cache: TokenCache, http_client: impl Into<Arc<C>>) -> Self {
		Self { http_client: http_client.into(), cache }
	}

	/// Routes a strategy descriptor to the matching acquisition flow.
	///
	/// A pure dispatcher: matching is exhaustive over the closed [`HookStrategy`] set and
	/// the method adds no caching and no error handling of its own.
	pub async fn pre_tool_use(&self, strategy: &HookStrategy) -> Result<TokenGrant> {
		match strategy {
			HookStrategy::ClientCredentialsExchange { client, exchange } =>
				self.client_credentials_exchange(client, exchange).await,
			HookStrategy::UserTokenExchange { provider, user_token, exchange } =>
				self.user_token_exchange(provider, user_token, exchange).await,
			HookStrategy::Connections { provider, user_token, connection } =>
				self.user_connections_token(provider, user_token, connection).await,
			HookStrategy::Ciba { client, identity, consent } =>
				self.ciba_flow(client, identity, consent).await,
		}
	}

	/// Binds a strategy so repeated tool invocations can acquire tokens with no arguments.
	pub fn bind(&self, strategy: HookStrategy) -> BoundHook<C> {
		BoundHook { broker: self.clone(), strategy: Arc::new(strategy) }
	}
}
#[cfg(feature = "reqwest")]
impl HookBroker<ReqwestHttpClient> {
	/// Creates a broker with a fresh cache and the default reqwest transport.
	pub fn new() -> Self {
		Self::with_http_client(TokenCache::default(), ReqwestHttpClient::default())
	}
}
#[cfg(feature = "reqwest")]
impl Default for HookBroker<ReqwestHttpClient> {
	fn default() -> Self {
		Self::new()
	}
}
impl<C> Clone for HookBroker<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self { http_client: self.http_client.clone(), cache: self.cache.clone() }
	}
}
impl<C> Debug for HookBroker<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HookBroker").field("cache", &self.cache).finish()
	}
}

/// Closed set of credential-acquisition strategies accepted by the dispatcher.
///
/// Adding a variant is a compile-visible change for every dispatcher; there is no default
/// fallthrough.
#[derive(Clone, Debug)]
pub enum HookStrategy {
	/// Two-hop machine-identity flow: client-credentials grant, then token exchange.
	ClientCredentialsExchange {
		/// Machine identity performing both hops.
		client: ClientConfig,
		/// Audience/scope selection for the exchanged token.
		exchange: TokenExchangeParams,
	},
	/// On-behalf-of exchange of an existing user session token.
	UserTokenExchange {
		/// Provider the user session belongs to.
		provider: ProviderConfig,
		/// User access token already authenticated upstream.
		user_token: TokenSecret,
		/// Audience/scope selection for the exchanged token.
		exchange: TokenExchangeParams,
	},
	/// Raw third-party token retrieval for a stored outbound connection.
	Connections {
		/// Provider holding the outbound connection.
		provider: ProviderConfig,
		/// User access token already authenticated upstream.
		user_token: TokenSecret,
		/// Connection selection and retrieval options.
		connection: ConnectionsParams,
	},
	/// Decoupled backchannel consent with polling.
	Ciba {
		/// Machine identity initiating the consent request.
		client: ClientConfig,
		/// Identifies the user who must approve.
		identity: UserIdentity,
		/// Consent parameters and polling pacing.
		consent: CibaParams,
	},
}

/// A strategy bound to a broker, callable with no arguments once per tool invocation.
///
/// Cloning is cheap; the strategy payload is shared. The bound hook adds no caching beyond
/// what the underlying strategy already provides.
pub struct BoundHook<C>
where
	C: ?Sized + TokenHttpClient,
{
	broker: HookBroker<C>,
	strategy: Arc<HookStrategy>,
}
impl<C> BoundHook<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Acquires a grant for the bound strategy.
	pub async fn acquire(&self) -> Result<TokenGrant> {
		self.broker.pre_tool_use(&self.strategy).await
	}

	/// Returns the bound strategy descriptor.
	pub fn strategy(&self) -> &HookStrategy {
		&self.strategy
	}
}
impl<C> Clone for BoundHook<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self { broker: self.broker.clone(), strategy: self.strategy.clone() }
	}
}
impl<C> Debug for BoundHook<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BoundHook").field("strategy", &self.strategy).finish()
	}
}
