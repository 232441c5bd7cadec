//! Per endpoint class response caches with in-flight coalescing.

use crate::config::{CachePolicy, CachesConfig, ExpireAfter};
use crate::errors::ApiError;
use crate::metrics_defs::{CACHE_HIT, CACHE_MISS};
use crate::types::{Account, LeagueStandings, MatchSummary, Summoner};
use moka::future::Cache;
use shared::counter;
use std::future::Future;
use std::time::Duration;

/// Why a computed value was not stored.
enum Uncached {
    Absent,
    Failed(ApiError),
}

/// A value returned by the cache. `fresh` is true only for the caller whose
/// producer stored it; hits and coalesced waiters see false.
#[derive(Clone, Debug, PartialEq)]
pub struct Cached<V> {
    pub value: V,
    pub fresh: bool,
}

/// A named cache in front of one upstream endpoint class.
///
/// Concurrent `get_or_compute` calls for the same key share a single
/// producer run. Failures and "not found" results are handed to every
/// waiting caller but never stored, so the next call starts over.
#[derive(Clone)]
pub struct ResponseCache<V> {
    name: &'static str,
    inner: Cache<String, V>,
}

impl<V> ResponseCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, policy: &CachePolicy) -> Self {
        let ttl = Duration::from_secs(policy.ttl_secs);
        let builder = Cache::builder().name(name).max_capacity(policy.max_entries);
        let inner = match policy.expire_after {
            ExpireAfter::Write => builder.time_to_live(ttl).build(),
            ExpireAfter::Access => builder.time_to_idle(ttl).build(),
        };

        ResponseCache { name, inner }
    }

    pub async fn get_or_compute<F>(&self, key: String, producer: F) -> Result<Option<V>, ApiError>
    where
        F: Future<Output = Result<Option<V>, ApiError>>,
    {
        Ok(self
            .get_or_compute_entry(key, producer)
            .await?
            .map(|cached| cached.value))
    }

    /// Like [`get_or_compute`](Self::get_or_compute), but also reports
    /// whether this call ran the producer.
    pub async fn get_or_compute_entry<F>(
        &self,
        key: String,
        producer: F,
    ) -> Result<Option<Cached<V>>, ApiError>
    where
        F: Future<Output = Result<Option<V>, ApiError>>,
    {
        let entry = self
            .inner
            .entry(key)
            .or_try_insert_with(async move {
                match producer.await {
                    Ok(Some(value)) => Ok(value),
                    Ok(None) => Err(Uncached::Absent),
                    Err(e) => Err(Uncached::Failed(e)),
                }
            })
            .await;

        match entry {
            Ok(entry) => {
                let fresh = entry.is_fresh();
                let metric = if fresh { CACHE_MISS } else { CACHE_HIT };
                counter!(metric, "cache" => self.name).increment(1);
                Ok(Some(Cached {
                    value: entry.into_value(),
                    fresh,
                }))
            }
            Err(uncached) => {
                counter!(CACHE_MISS, "cache" => self.name).increment(1);
                match uncached.as_ref() {
                    Uncached::Absent => Ok(None),
                    Uncached::Failed(e) => Err(e.clone()),
                }
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).await
    }

    /// Number of live entries, after pending maintenance has run.
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

/// Riot IDs are case-insensitive: "Foo#bar" and "foo#BAR" are the same player.
pub fn riot_id_key(game_name: &str, tag_line: &str) -> String {
    format!(
        "{}#{}",
        game_name.trim().to_lowercase(),
        tag_line.trim().to_lowercase()
    )
}

pub fn league_by_puuid_key(puuid: &str) -> String {
    format!("puuid:{puuid}")
}

pub fn league_by_summoner_key(summoner_id: &str) -> String {
    format!("summoner:{summoner_id}")
}

pub fn match_ids_key(puuid: &str, count: u32) -> String {
    format!("{puuid}-{count}")
}

/// The caches owned by one client instance.
#[derive(Clone)]
pub struct ResponseCaches {
    pub accounts: ResponseCache<Account>,
    pub summoners: ResponseCache<Summoner>,
    pub league_entries: ResponseCache<LeagueStandings>,
    pub match_ids: ResponseCache<Vec<String>>,
    pub match_details: ResponseCache<MatchSummary>,
}

impl ResponseCaches {
    pub fn new(config: &CachesConfig) -> Self {
        ResponseCaches {
            accounts: ResponseCache::new("accounts", &config.accounts),
            summoners: ResponseCache::new("summoners", &config.summoners),
            league_entries: ResponseCache::new("league_entries", &config.league_entries),
            match_ids: ResponseCache::new("match_ids", &config.match_ids),
            match_details: ResponseCache::new("match_details", &config.match_details),
        }
    }
}
