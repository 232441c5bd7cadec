//! Assembles an [`AggregatedProfile`] from the upstream API and the LP
//! snapshot log.
//!
//! The identity chain (account, then summoner) is fatal on the first failure.
//! Once the summoner is known, league entries and match history are fetched
//! concurrently and each fails in isolation, degrading only its own section.
use crate::champions::champion_play_counts;
use crate::config::ProfileConfig;
use crate::errors::ProfileError;
use crate::fanout::BatchFetcher;
use crate::lp_delta;
use crate::metrics_defs::{PROFILE_BUILD_DURATION, PROFILES_BUILT};
use crate::riot_id::RiotId;
use crate::snapshots::{self, SnapshotStore};
use crate::types::{AggregatedProfile, NO_RECENT_MATCHES, ProfileNotes};
use riot_client::types::{LeagueEntry, MatchSummary, Summoner};
use riot_client::{ApiError, RiotApi};
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

pub struct ProfileAggregator {
    api: Arc<dyn RiotApi>,
    snapshots: Arc<dyn SnapshotStore>,
    fetcher: BatchFetcher,
    match_count: u32,
}

impl ProfileAggregator {
    pub fn new(
        api: Arc<dyn RiotApi>,
        snapshots: Arc<dyn SnapshotStore>,
        config: &ProfileConfig,
    ) -> Self {
        ProfileAggregator {
            fetcher: BatchFetcher::new(api.clone(), config.fanout.batch_size),
            api,
            snapshots,
            match_count: config.match_count,
        }
    }

    /// Builds the profile for `game_name#tag_line`. Never fails: terminal
    /// problems are carried in [`AggregatedProfile::error`].
    pub async fn aggregate(&self, game_name: &str, tag_line: &str) -> AggregatedProfile {
        let start = Instant::now();

        let (profile, outcome) = match self.resolve_summoner(game_name, tag_line).await {
            Ok((puuid, summoner)) => {
                let profile = self.enrich(&puuid, summoner).await;
                let outcome = if profile.notes.league_error.is_some()
                    || profile.notes.match_history_error.is_some()
                {
                    "partial"
                } else {
                    "complete"
                };
                (profile, outcome)
            }
            Err(e) => {
                let outcome = match &e {
                    ProfileError::NotFound { .. } => {
                        tracing::info!(game_name, tag_line, "Summoner not found");
                        "not_found"
                    }
                    ProfileError::MalformedRiotId | ProfileError::EmptyRiotIdPart => {
                        tracing::debug!(game_name, tag_line, "Rejected Riot ID");
                        "invalid"
                    }
                    ProfileError::Upstream(source) => {
                        tracing::error!(
                            game_name,
                            tag_line,
                            error = %source,
                            "Error fetching summoner data"
                        );
                        "failed"
                    }
                };
                (AggregatedProfile::failed(&e), outcome)
            }
        };

        counter!(PROFILES_BUILT, "outcome" => outcome).increment(1);
        histogram!(PROFILE_BUILD_DURATION).record(start.elapsed().as_secs_f64());
        profile
    }

    /// Account then summoner. Returns the PUUID with the summoner whose
    /// display name has been resolved.
    async fn resolve_summoner(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<(String, Summoner), ProfileError> {
        let riot_id = RiotId::new(game_name, tag_line)?;
        let not_found = || ProfileError::NotFound {
            riot_id: riot_id.to_string(),
        };

        let account = self
            .api
            .account_by_riot_id(&riot_id.game_name, &riot_id.tag_line)
            .await?
            .ok_or_else(not_found)?;
        let Some(puuid) = account.puuid() else {
            tracing::warn!(riot_id = %riot_id, "Account has no PUUID");
            return Err(not_found());
        };

        let mut summoner = self
            .api
            .summoner_by_puuid(puuid)
            .await?
            .ok_or_else(not_found)?;

        summoner.display_name = match account.game_name() {
            Some(name) => name.to_string(),
            None => {
                tracing::warn!(
                    puuid,
                    fallback = %riot_id.game_name,
                    "Account has no game name, using the searched name"
                );
                riot_id.game_name.clone()
            }
        };

        Ok((puuid.to_string(), summoner))
    }

    async fn enrich(&self, puuid: &str, summoner: Summoner) -> AggregatedProfile {
        let (league, history) = tokio::join!(self.league_entries(puuid), self.match_history(puuid));

        let mut notes = ProfileNotes::default();

        let league_entries = match league {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(puuid, error = %e, "Error fetching league entries");
                notes.league_error = Some(format!("Error fetching league data: {e}"));
                Vec::new()
            }
        };

        let mut match_history = match history {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(puuid, error = %e, "Error fetching match history");
                notes.match_history_error = Some(format!("Error fetching match history: {e}"));
                Vec::new()
            }
        };

        lp_delta::correlate(self.snapshots.as_ref(), puuid, &mut match_history);

        if match_history.is_empty() && notes.match_history_error.is_none() {
            notes.match_history_info = Some(NO_RECENT_MATCHES.to_string());
        }
        let champion_play_counts = champion_play_counts(&match_history, puuid);

        AggregatedProfile {
            profile_icon_url: Some(self.api.profile_icon_url(summoner.profile_icon_id)),
            summoner: Some(summoner),
            league_entries,
            match_history,
            champion_play_counts,
            notes,
            error: None,
        }
    }

    /// Fetches league entries and, when they come fresh from upstream,
    /// records a snapshot per ranked queue.
    async fn league_entries(&self, puuid: &str) -> Result<Vec<LeagueEntry>, ApiError> {
        let standings = self.api.league_entries_by_puuid(puuid).await?;
        snapshots::record_standings(self.snapshots.as_ref(), puuid, &standings);
        Ok(standings.entries)
    }

    async fn match_history(&self, puuid: &str) -> Result<Vec<MatchSummary>, ApiError> {
        let match_ids = self.api.match_ids_by_puuid(puuid, self.match_count).await?;
        if match_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.fetcher.fetch_match_details(&match_ids).await)
    }
}
