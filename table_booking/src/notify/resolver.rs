//! Display name → Discord member resolution.

use log::{debug, warn};
use std::{sync::Arc, time::Duration};

use super::cache::{ExpiringCache, TtlCache};
use crate::discord::{ChatClient, Member};

/// Resolves booking player names to guild members.
///
/// Each distinct name costs at most one member search per cache lifetime.
/// Empty search results are cached too, so unknown names do not hammer the
/// API; failed searches are not.
#[derive(Clone)]
pub struct IdentityResolver {
    client: Arc<dyn ChatClient>,
    cache: Arc<dyn ExpiringCache<Vec<Member>>>,
}

impl IdentityResolver {
    pub fn new(client: Arc<dyn ChatClient>, cache: Arc<dyn ExpiringCache<Vec<Member>>>) -> Self {
        Self { client, cache }
    }

    /// Resolver backed by a private [`TtlCache`]
    pub fn with_ttl(client: Arc<dyn ChatClient>, ttl: Duration) -> Self {
        Self::new(client, Arc::new(TtlCache::new(ttl)))
    }

    /// Best matching member for `display_name`, or `None` when nobody
    /// matches or the lookup failed.
    ///
    /// The raw display name is both the cache key and the search query.
    pub async fn resolve(&self, display_name: &str) -> Option<Member> {
        if display_name.trim().is_empty() {
            return None;
        }

        if let Some(members) = self.cache.get(display_name).await {
            debug!("Member cache hit for '{display_name}'");
            return members.into_iter().next();
        }

        match self.client.search_members(display_name, 1).await {
            Ok(members) => {
                let best = members.first().cloned();
                self.cache.insert(display_name.to_string(), members).await;
                best
            }
            Err(e) => {
                warn!("Failed to resolve Discord member '{display_name}': {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedChatClient;

    #[tokio::test]
    async fn test_resolves_and_caches_member() {
        let client = Arc::new(ScriptedChatClient::new().with_member("42", "player2"));
        let resolver = IdentityResolver::with_ttl(client.clone(), Duration::from_secs(60));

        let first = resolver.resolve("player2").await.unwrap();
        let second = resolver.resolve("player2").await.unwrap();

        assert_eq!(first.user.id, "42");
        assert_eq!(first, second);
        assert_eq!(client.search_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_is_keyed_on_raw_name() {
        let client = Arc::new(ScriptedChatClient::new().with_member("42", "player2"));
        let cache: Arc<TtlCache<Vec<Member>>> = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let resolver = IdentityResolver::new(client.clone(), cache.clone());

        assert!(resolver.resolve("player2").await.is_some());
        assert!(resolver.resolve(" player2").await.is_none());

        assert_eq!(client.search_count(), 2);
        assert!(cache.get("player2").await.is_some());
        assert_eq!(cache.get(" player2").await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_unknown_name_is_cached_as_empty() {
        let client = Arc::new(ScriptedChatClient::new());
        let resolver = IdentityResolver::with_ttl(client.clone(), Duration::from_secs(60));

        assert!(resolver.resolve("ghost").await.is_none());
        assert!(resolver.resolve("ghost").await.is_none());
        assert_eq!(client.search_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_search_is_not_cached() {
        let client = Arc::new(ScriptedChatClient::new().failing_searches());
        let resolver = IdentityResolver::with_ttl(client.clone(), Duration::from_secs(60));

        assert!(resolver.resolve("player2").await.is_none());
        assert!(resolver.resolve("player2").await.is_none());
        assert_eq!(client.search_count(), 2);
    }

    #[tokio::test]
    async fn test_blank_name_skips_lookup() {
        let client = Arc::new(ScriptedChatClient::new());
        let resolver = IdentityResolver::with_ttl(client.clone(), Duration::from_secs(60));

        assert!(resolver.resolve("   ").await.is_none());
        assert_eq!(client.search_count(), 0);
    }
}
