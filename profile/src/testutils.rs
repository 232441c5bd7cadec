use crate::snapshots::{LpSnapshot, SnapshotStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use riot_client::types::{Account, LeagueEntry, LeagueStandings, MatchSummary, QueueType, Summoner};
use riot_client::{ApiError, Endpoint, RiotApi};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn server_fault(endpoint: Endpoint) -> ApiError {
    ApiError::ServerFault {
        endpoint,
        status: 503,
        body: String::new(),
    }
}

/// Scripted upstream. Anything not configured is reported as absent.
#[derive(Default)]
pub struct FakeRiotApi {
    pub accounts: HashMap<String, Result<Option<Account>, ApiError>>,
    pub summoners: HashMap<String, Result<Option<Summoner>, ApiError>>,
    pub league: Option<Result<Vec<LeagueEntry>, ApiError>>,
    /// Overrides the read time of league entries, which defaults to now.
    pub league_fetched_at: Option<i64>,
    /// Report league entries as served from the response cache.
    pub league_from_cache: bool,
    pub match_ids: Option<Result<Vec<String>, ApiError>>,
    pub matches: HashMap<String, MatchSummary>,
    pub failing_matches: HashSet<String>,
    pub detail_delay: Duration,

    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    completed: AtomicUsize,
    detail_starts: Mutex<Vec<(String, usize)>>,
}

impl FakeRiotApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_player(mut self, game_name: &str, tag_line: &str, puuid: &str) -> Self {
        self.accounts.insert(
            format!("{game_name}#{tag_line}").to_lowercase(),
            Ok(Some(Account {
                puuid: Some(puuid.to_string()),
                game_name: Some(game_name.to_string()),
                tag_line: Some(tag_line.to_string()),
            })),
        );
        self.summoners.insert(
            puuid.to_string(),
            Ok(Some(Summoner {
                id: Some(format!("summoner-{puuid}")),
                puuid: puuid.to_string(),
                display_name: String::new(),
                profile_icon_id: 4568,
                summoner_level: 312,
            })),
        );
        self
    }

    pub fn with_matches(mut self, matches: Vec<MatchSummary>) -> Self {
        self.match_ids = Some(Ok(matches.iter().map(|m| m.match_id.clone()).collect()));
        self.matches = matches.into_iter().map(|m| (m.match_id.clone(), m)).collect();
        self
    }

    pub fn with_detail_delay(mut self, delay: Duration) -> Self {
        self.detail_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Each detail request with the number of requests that had already
    /// completed when it started.
    pub fn detail_starts(&self) -> Vec<(String, usize)> {
        self.detail_starts.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl RiotApi for FakeRiotApi {
    async fn account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Option<Account>, ApiError> {
        self.record(format!("account:{game_name}#{tag_line}"));
        let key = format!("{game_name}#{tag_line}").to_lowercase();
        self.accounts.get(&key).cloned().unwrap_or(Ok(None))
    }

    async fn summoner_by_puuid(&self, puuid: &str) -> Result<Option<Summoner>, ApiError> {
        self.record(format!("summoner:{puuid}"));
        self.summoners.get(puuid).cloned().unwrap_or(Ok(None))
    }

    async fn league_entries_by_puuid(&self, puuid: &str) -> Result<LeagueStandings, ApiError> {
        self.record(format!("league:{puuid}"));
        let entries = self.league.clone().unwrap_or(Ok(Vec::new()))?;
        let mut standings = LeagueStandings::fetched_now(entries);
        if let Some(fetched_at) = self.league_fetched_at {
            standings.fetched_at = fetched_at;
        }
        standings.fresh = !self.league_from_cache;
        Ok(standings)
    }

    async fn match_ids_by_puuid(&self, puuid: &str, count: u32) -> Result<Vec<String>, ApiError> {
        self.record(format!("match_ids:{puuid}:{count}"));
        let mut ids = self.match_ids.clone().unwrap_or(Ok(Vec::new()))?;
        ids.truncate(count as usize);
        Ok(ids)
    }

    async fn match_details(&self, match_id: &str) -> Result<Option<MatchSummary>, ApiError> {
        self.detail_starts
            .lock()
            .push((match_id.to_string(), self.completed.load(Ordering::SeqCst)));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.detail_delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.failing_matches.contains(match_id) {
            return Err(server_fault(Endpoint::MatchDetails));
        }
        Ok(self.matches.get(match_id).cloned())
    }

    fn profile_icon_url(&self, icon_id: i32) -> String {
        format!("https://icons.test/{icon_id}.jpg")
    }
}

/// A snapshot store whose every operation fails.
pub struct BrokenStore;

impl SnapshotStore for BrokenStore {
    fn append(&self, _snapshots: &[LpSnapshot]) -> Result<(), StoreError> {
        Err(std::io::Error::other("disk full").into())
    }

    fn latest_before(
        &self,
        _puuid: &str,
        _queue: QueueType,
        _timestamp: i64,
    ) -> Result<Option<LpSnapshot>, StoreError> {
        Err(std::io::Error::other("disk gone").into())
    }

    fn earliest_at_or_after(
        &self,
        _puuid: &str,
        _queue: QueueType,
        _timestamp: i64,
    ) -> Result<Option<LpSnapshot>, StoreError> {
        Err(std::io::Error::other("disk gone").into())
    }
}
