use crate::errors::Result;
use crate::types::{Account, LeagueStandings, MatchSummary, Summoner};
use async_trait::async_trait;

/// The upstream operations the aggregation pipeline depends on.
///
/// `Ok(None)` means the upstream reported the resource as not found.
/// List endpoints report "not found" as an empty list.
#[async_trait]
pub trait RiotApi: Send + Sync {
    async fn account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Option<Account>>;

    async fn summoner_by_puuid(&self, puuid: &str) -> Result<Option<Summoner>>;

    /// League entries stamped with the time of the upstream read that
    /// produced them.
    async fn league_entries_by_puuid(&self, puuid: &str) -> Result<LeagueStandings>;

    async fn match_ids_by_puuid(&self, puuid: &str, count: u32) -> Result<Vec<String>>;

    async fn match_details(&self, match_id: &str) -> Result<Option<MatchSummary>>;

    fn profile_icon_url(&self, icon_id: i32) -> String;
}
