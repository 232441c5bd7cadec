use crate::api::RiotApi;
use crate::cache::{
    Cached, ResponseCaches, league_by_puuid_key, league_by_summoner_key, match_ids_key, riot_id_key,
};
use crate::config::RiotConfig;
use crate::errors::{ClientError, Endpoint, Result};
use crate::executor::{ApiRequest, RequestExecutor};
use crate::routing::Routes;
use crate::types::{Account, LeagueEntry, LeagueStandings, MatchDto, MatchSummary, Summoner};
use async_trait::async_trait;

/// Typed client for the upstream game-data API.
///
/// Every lookup except `summoner_me` goes through the response cache of its
/// endpoint class. Clones share the HTTP connection pool and the caches.
#[derive(Clone)]
pub struct RiotClient {
    executor: RequestExecutor,
    routes: Routes,
    caches: ResponseCaches,
    community_dragon_url: String,
}

impl RiotClient {
    pub fn new(config: &RiotConfig) -> Result<Self, ClientError> {
        if config.has_placeholder_key() {
            tracing::warn!(
                "Riot API key is missing or placeholder. Set `riot.api_key` or the RIOT_API_KEY environment variable."
            );
        }

        let executor = RequestExecutor::new(
            config.api_key.trim(),
            &config.user_agent,
            config.retry.clone(),
            &config.timeouts,
        )?;
        let routes = Routes::from_config(config)?;
        tracing::info!(platform = routes.platform(), "Riot API client configured");

        Ok(RiotClient {
            executor,
            routes,
            caches: ResponseCaches::new(&config.caches),
            community_dragon_url: config.community_dragon_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn caches(&self) -> &ResponseCaches {
        &self.caches
    }

    pub fn platform(&self) -> &str {
        self.routes.platform()
    }

    /// Legacy lookup by encrypted summoner id. Shares the league-entries cache.
    pub async fn league_entries_by_summoner_id(
        &self,
        summoner_id: &str,
    ) -> Result<Vec<LeagueEntry>> {
        let request = ApiRequest::new(
            Endpoint::LeagueEntriesBySummoner,
            self.routes.league_entries_by_summoner(summoner_id)?,
        );
        let standings = self
            .league_standings(league_by_summoner_key(summoner_id), request)
            .await?;
        Ok(standings.entries)
    }

    /// Reads through the league cache. Entries stored by this call are
    /// fresh and carry the time of the upstream answer.
    async fn league_standings(&self, key: String, request: ApiRequest) -> Result<LeagueStandings> {
        let cached = self
            .caches
            .league_entries
            .get_or_compute_entry(key, async move {
                let entries: Option<Vec<LeagueEntry>> = self.executor.execute(&request).await?;
                Ok(entries.map(LeagueStandings::fetched_now))
            })
            .await?;

        Ok(match cached {
            Some(Cached { mut value, fresh }) => {
                value.fresh = fresh;
                value
            }
            None => LeagueStandings::fetched_now(Vec::new()),
        })
    }

    /// Summoner of the user owning `bearer_token`. Never cached.
    pub async fn summoner_me(&self, bearer_token: &str) -> Result<Option<Summoner>> {
        let request =
            ApiRequest::with_bearer(Endpoint::SummonerMe, self.routes.summoner_me()?, bearer_token);
        self.executor.execute(&request).await
    }
}

#[async_trait]
impl RiotApi for RiotClient {
    async fn account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Option<Account>> {
        let request = ApiRequest::new(
            Endpoint::Account,
            self.routes.account_by_riot_id(game_name, tag_line)?,
        );
        tracing::debug!(game_name, tag_line, "Looking up account");

        self.caches
            .accounts
            .get_or_compute(riot_id_key(game_name, tag_line), async move {
                self.executor.execute(&request).await
            })
            .await
    }

    async fn summoner_by_puuid(&self, puuid: &str) -> Result<Option<Summoner>> {
        let request = ApiRequest::new(Endpoint::Summoner, self.routes.summoner_by_puuid(puuid)?);

        self.caches
            .summoners
            .get_or_compute(puuid.to_string(), async move {
                self.executor.execute(&request).await
            })
            .await
    }

    async fn league_entries_by_puuid(&self, puuid: &str) -> Result<LeagueStandings> {
        let request = ApiRequest::new(
            Endpoint::LeagueEntries,
            self.routes.league_entries_by_puuid(puuid)?,
        );
        self.league_standings(league_by_puuid_key(puuid), request).await
    }

    async fn match_ids_by_puuid(&self, puuid: &str, count: u32) -> Result<Vec<String>> {
        let request = ApiRequest::new(
            Endpoint::MatchIds,
            self.routes.match_ids_by_puuid(puuid, count)?,
        );

        let ids = self
            .caches
            .match_ids
            .get_or_compute(match_ids_key(puuid, count), async move {
                self.executor.execute(&request).await
            })
            .await?;
        Ok(ids.unwrap_or_default())
    }

    async fn match_details(&self, match_id: &str) -> Result<Option<MatchSummary>> {
        let request = ApiRequest::new(Endpoint::MatchDetails, self.routes.match_details(match_id)?);

        self.caches
            .match_details
            .get_or_compute(match_id.to_string(), async move {
                let dto: Option<MatchDto> = self.executor.execute(&request).await?;
                Ok(dto.map(MatchSummary::from))
            })
            .await
    }

    fn profile_icon_url(&self, icon_id: i32) -> String {
        format!("{}/{icon_id}.jpg", self.community_dragon_url)
    }
}
