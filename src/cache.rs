//! Expiry-aware in-memory grant cache shared by every hook strategy.

// self
use crate::{_prelude::*, auth::TokenGrant, obs::FlowKind};

/// Safety margin below which a cached grant is treated as a miss.
///
/// A grant that expires mid-flight to the downstream resource is worse than a cache miss,
/// so lookups only hit while strictly more than this margin of validity remains.
pub const FRESHNESS_MARGIN: Duration = Duration::seconds(30);

/// Unique key for a cached grant: one per strategy + identity + audience + scope tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
	kind: FlowKind,
	segments: Arc<[String]>,
}
impl CacheKey {
	/// Builds a key from the flow discriminant and its identifying segments.
	///
	/// Segments derived from secrets must be fingerprints, never raw token material.
	pub fn new<I, S>(kind: FlowKind, segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { kind, segments: segments.into_iter().map(Into::into).collect() }
	}
}

type CacheMap = Arc<RwLock<HashMap<CacheKey, TokenGrant>>>;

/// Process-lifetime token cache with expiry-aware retrieval.
///
/// The cache is an explicit, constructor-injected object so hosts and tests can run
/// isolated instances instead of sharing process-wide state. Entries are evicted lazily
/// when a lookup finds them inside the freshness margin; [`TokenCache::sweep`] lets
/// long-running hosts drop stale entries in bulk on their own cadence.
///
/// Reads and writes are atomic per key and nothing more: concurrent lookups for the same
/// key may both miss and both contact the provider.
#[derive(Clone, Debug, Default)]
pub struct TokenCache(CacheMap);
impl TokenCache {
	/// Returns the cached grant when strictly more than [`FRESHNESS_MARGIN`] of validity
	/// remains at `now`; otherwise evicts the entry and reports a miss.
	pub fn fresh(&self, key: &CacheKey, now: OffsetDateTime) -> Option<TokenGrant> {
		{
			let map = self.0.read();
			let entry = map.get(key)?;

			if entry.is_fresh_at(now, FRESHNESS_MARGIN) {
				return Some(entry.clone());
			}
		}

		self.0.write().remove(key);

		None
	}

	/// Stores a grant and returns it for chaining.
	pub fn store(&self, key: CacheKey, grant: TokenGrant) -> TokenGrant {
		self.0.write().insert(key, grant.clone());

		grant
	}

	/// Drops every entry that is inside the freshness margin at `now`.
	pub fn sweep(&self, now: OffsetDateTime) {
		self.0.write().retain(|_, grant| grant.is_fresh_at(now, FRESHNESS_MARGIN));
	}

	/// Number of cached grants, stale entries included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no grants are cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn grant_expiring_in(secs: i64, now: OffsetDateTime) -> TokenGrant {
		TokenGrant::builder()
			.access_token("cached")
			.issued_at(now)
			.expires_in(Duration::seconds(secs))
			.build()
			.expect("Grant fixture should build successfully.")
	}

	fn key(label: &str) -> CacheKey {
		CacheKey::new(FlowKind::ClientCredentialsExchange, [label, "aud", "scope-fp"])
	}

	#[test]
	fn lookups_inside_the_margin_miss_and_evict() {
		let cache = TokenCache::default();
		let now = OffsetDateTime::now_utc();

		cache.store(key("short"), grant_expiring_in(29, now));

		assert_eq!(cache.len(), 1);
		assert!(cache.fresh(&key("short"), now).is_none(), "29 s remaining must miss.");
		assert!(cache.is_empty(), "Stale entries are evicted on lookup.");
	}

	#[test]
	fn exactly_the_margin_remaining_is_a_miss() {
		let cache = TokenCache::default();
		let now = OffsetDateTime::now_utc();

		cache.store(key("edge"), grant_expiring_in(30, now));

		assert!(cache.fresh(&key("edge"), now).is_none(), "Strictly-more-than is required.");
	}

	#[test]
	fn fresh_entries_hit_and_store_chains() {
		let cache = TokenCache::default();
		let now = OffsetDateTime::now_utc();
		let stored = cache.store(key("fresh"), grant_expiring_in(3600, now));

		assert_eq!(stored.access_token.expose(), "cached");

		let hit = cache.fresh(&key("fresh"), now).expect("Fresh entry should hit.");

		assert_eq!(hit.access_token.expose(), "cached");
		assert_eq!(hit.expires_at, stored.expires_at);
	}

	#[test]
	fn keys_partition_by_flow_kind_and_segments() {
		let cache = TokenCache::default();
		let now = OffsetDateTime::now_utc();
		let connections_key =
			CacheKey::new(FlowKind::Connections, ["github", "U1", "fp"]);

		cache.store(key("a"), grant_expiring_in(3600, now));
		cache.store(connections_key.clone(), grant_expiring_in(3600, now));

		assert_eq!(cache.len(), 2);
		assert!(cache.fresh(&key("b"), now).is_none());
		assert!(cache.fresh(&connections_key, now).is_some());
	}

	#[test]
	fn sweep_drops_only_stale_entries() {
		let cache = TokenCache::default();
		let now = OffsetDateTime::now_utc();

		cache.store(key("stale"), grant_expiring_in(10, now));
		cache.store(key("live"), grant_expiring_in(600, now));
		cache.sweep(now);

		assert_eq!(cache.len(), 1);
		assert!(cache.fresh(&key("live"), now).is_some());
	}
}
