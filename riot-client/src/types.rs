use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Account-v1 record. Identifies a player across regions.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub puuid: Option<String>,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub tag_line: Option<String>,
}

impl Account {
    /// The PUUID, if the upstream returned a non-empty one.
    pub fn puuid(&self) -> Option<&str> {
        self.puuid.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn game_name(&self) -> Option<&str> {
        self.game_name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
    /// Encrypted summoner id. No longer returned by every platform.
    #[serde(default)]
    pub id: Option<String>,
    pub puuid: String,
    #[serde(default, alias = "name")]
    pub display_name: String,
    #[serde(default)]
    pub profile_icon_id: i32,
    #[serde(default)]
    pub summoner_level: i64,
}

/// Queues that accrue league points and are tracked for LP history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum QueueType {
    #[serde(rename = "RANKED_SOLO_5x5")]
    RankedSolo,
    #[serde(rename = "RANKED_FLEX_SR")]
    RankedFlex,
}

impl QueueType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            QueueType::RankedSolo => "RANKED_SOLO_5x5",
            QueueType::RankedFlex => "RANKED_FLEX_SR",
        }
    }

    /// Maps a match-v5 queue id to its ranked queue, if any.
    pub const fn from_queue_id(queue_id: i32) -> Option<Self> {
        match queue_id {
            420 => Some(QueueType::RankedSolo),
            440 => Some(QueueType::RankedFlex),
            _ => None,
        }
    }

    pub fn from_league_queue(queue_type: &str) -> Option<Self> {
        match queue_type {
            "RANKED_SOLO_5x5" => Some(QueueType::RankedSolo),
            "RANKED_FLEX_SR" => Some(QueueType::RankedFlex),
            _ => None,
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    pub queue_type: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub league_points: i32,
    #[serde(default)]
    pub wins: i32,
    #[serde(default)]
    pub losses: i32,
}

impl LeagueEntry {
    pub fn ranked_queue(&self) -> Option<QueueType> {
        QueueType::from_league_queue(&self.queue_type)
    }
}

/// A player's league entries as of one upstream read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeagueStandings {
    pub entries: Vec<LeagueEntry>,
    /// Epoch milliseconds at which the upstream answered. Cache hits keep
    /// the time of the original read.
    pub fetched_at: i64,
    /// False when the entries were served from the response cache.
    pub fresh: bool,
}

impl LeagueStandings {
    pub fn fetched_now(entries: Vec<LeagueEntry>) -> Self {
        LeagueStandings {
            entries,
            fetched_at: now_millis(),
            fresh: true,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    #[serde(default)]
    pub puuid: String,
    #[serde(default)]
    pub champion_name: String,
    #[serde(default)]
    pub riot_id_game_name: Option<String>,
    #[serde(default)]
    pub team_id: i32,
    #[serde(default)]
    pub kills: i32,
    #[serde(default)]
    pub deaths: i32,
    #[serde(default)]
    pub assists: i32,
    #[serde(default)]
    pub win: bool,
}

/// A finished match, flattened from the match-v5 payload.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: String,
    pub queue_id: i32,
    /// Epoch milliseconds
    pub game_end_timestamp: i64,
    pub game_duration: i64,
    pub game_mode: String,
    pub participants: Vec<ParticipantSummary>,
    /// League points gained (positive) or lost (negative) in this match.
    /// `None` until correlated, and permanently `None` for unranked queues.
    pub lp_change: Option<i32>,
}

impl MatchSummary {
    pub fn ranked_queue(&self) -> Option<QueueType> {
        QueueType::from_queue_id(self.queue_id)
    }

    pub fn participant(&self, puuid: &str) -> Option<&ParticipantSummary> {
        self.participants.iter().find(|p| p.puuid == puuid)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchMetadataDto {
    match_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchInfoDto {
    #[serde(default)]
    queue_id: i32,
    #[serde(default)]
    game_end_timestamp: i64,
    #[serde(default)]
    game_duration: i64,
    #[serde(default)]
    game_mode: String,
    #[serde(default)]
    participants: Vec<ParticipantSummary>,
}

/// Wire shape of `/lol/match/v5/matches/{matchId}`.
#[derive(Deserialize)]
pub(crate) struct MatchDto {
    metadata: MatchMetadataDto,
    info: MatchInfoDto,
}

impl From<MatchDto> for MatchSummary {
    fn from(dto: MatchDto) -> Self {
        MatchSummary {
            match_id: dto.metadata.match_id,
            queue_id: dto.info.queue_id,
            game_end_timestamp: dto.info.game_end_timestamp,
            game_duration: dto.info.game_duration,
            game_mode: dto.info.game_mode,
            participants: dto.info.participants,
            lp_change: None,
        }
    }
}
