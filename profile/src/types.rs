use crate::errors::ProfileError;
use indexmap::IndexMap;
use riot_client::types::{LeagueEntry, MatchSummary, Summoner};
use serde::Serialize;

pub const NO_RECENT_MATCHES: &str = "No recent matches found.";

/// Section-local advisories. None of these make the profile a failure.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileNotes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub league_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_history_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_history_info: Option<String>,
}

impl ProfileNotes {
    pub fn is_empty(&self) -> bool {
        self.league_error.is_none()
            && self.match_history_error.is_none()
            && self.match_history_info.is_none()
    }
}

/// Everything known about one player. Either populated, or carrying a
/// single terminal `error` with every section empty.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedProfile {
    pub summoner: Option<Summoner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_icon_url: Option<String>,
    pub league_entries: Vec<LeagueEntry>,
    pub match_history: Vec<MatchSummary>,
    pub champion_play_counts: IndexMap<String, u32>,
    pub notes: ProfileNotes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AggregatedProfile {
    pub fn failed(error: &ProfileError) -> Self {
        let info = if error.is_not_found() {
            "Summoner not found, cannot display match history."
        } else {
            "An error occurred, cannot display match history."
        };
        AggregatedProfile {
            notes: ProfileNotes {
                match_history_info: Some(info.to_string()),
                ..Default::default()
            },
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
