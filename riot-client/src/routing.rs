//! Host selection for the platform and regional API clusters.

use crate::config::RiotConfig;
use crate::errors::{ApiError, ClientError, Result};
use url::Url;

/// Maps a platform (e.g. "euw1") to the regional cluster serving the
/// account and match APIs. Unknown platforms are used as-is.
pub fn regional_route(platform: &str) -> &str {
    match platform {
        "euw1" | "eun1" | "tr1" | "ru" | "me1" => "europe",
        "na1" | "br1" | "la1" | "la2" | "oc1" => "americas",
        "kr" | "jp1" => "asia",
        "vn2" | "ph2" | "sg2" | "th2" | "tw2" | "id1" => "sea",
        _ => {
            tracing::warn!(
                platform,
                "Unknown platform region, using it as the regional route"
            );
            platform
        }
    }
}

#[derive(Clone, Debug)]
pub struct Routes {
    platform: String,
    platform_base: Url,
    regional_base: Url,
}

impl Routes {
    pub fn from_config(config: &RiotConfig) -> Result<Self, ClientError> {
        let platform = config.platform.trim().to_lowercase();

        let platform_base = match &config.platform_url {
            Some(url) => url.clone(),
            None => Url::parse(&format!("https://{platform}.api.riotgames.com"))?,
        };
        let regional_base = match &config.regional_url {
            Some(url) => url.clone(),
            None => Url::parse(&format!(
                "https://{}.api.riotgames.com",
                regional_route(&platform)
            ))?,
        };

        Ok(Routes {
            platform,
            platform_base,
            regional_base,
        })
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn account_by_riot_id(&self, game_name: &str, tag_line: &str) -> Result<Url> {
        join(
            &self.regional_base,
            &["riot", "account", "v1", "accounts", "by-riot-id", game_name, tag_line],
        )
    }

    pub fn summoner_by_puuid(&self, puuid: &str) -> Result<Url> {
        join(
            &self.platform_base,
            &["lol", "summoner", "v4", "summoners", "by-puuid", puuid],
        )
    }

    pub fn summoner_me(&self) -> Result<Url> {
        join(&self.platform_base, &["lol", "summoner", "v4", "summoners", "me"])
    }

    pub fn league_entries_by_puuid(&self, puuid: &str) -> Result<Url> {
        join(
            &self.platform_base,
            &["lol", "league", "v4", "entries", "by-puuid", puuid],
        )
    }

    pub fn league_entries_by_summoner(&self, summoner_id: &str) -> Result<Url> {
        join(
            &self.platform_base,
            &["lol", "league", "v4", "entries", "by-summoner", summoner_id],
        )
    }

    pub fn match_ids_by_puuid(&self, puuid: &str, count: u32) -> Result<Url> {
        let mut url = join(
            &self.regional_base,
            &["lol", "match", "v5", "matches", "by-puuid", puuid, "ids"],
        )?;
        url.query_pairs_mut()
            .append_pair("count", &count.to_string());
        Ok(url)
    }

    pub fn match_details(&self, match_id: &str) -> Result<Url> {
        join(&self.regional_base, &["lol", "match", "v5", "matches", match_id])
    }
}

// Segments are percent-encoded individually, so a '/' or '#' inside a
// Riot ID cannot change the path.
fn join(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regional_route() {
        assert_eq!(regional_route("euw1"), "europe");
        assert_eq!(regional_route("na1"), "americas");
        assert_eq!(regional_route("kr"), "asia");
        assert_eq!(regional_route("sg2"), "sea");
        assert_eq!(regional_route("pbe1"), "pbe1");
    }

    #[test]
    fn test_default_hosts() {
        let routes = Routes::from_config(&RiotConfig::new("EUW1", "key")).unwrap();
        assert_eq!(routes.platform(), "euw1");
        assert_eq!(
            routes.summoner_by_puuid("abc").unwrap().as_str(),
            "https://euw1.api.riotgames.com/lol/summoner/v4/summoners/by-puuid/abc"
        );
        assert_eq!(
            routes.match_ids_by_puuid("abc", 20).unwrap().as_str(),
            "https://europe.api.riotgames.com/lol/match/v5/matches/by-puuid/abc/ids?count=20"
        );
        assert_eq!(
            routes.league_entries_by_summoner("enc").unwrap().as_str(),
            "https://euw1.api.riotgames.com/lol/league/v4/entries/by-summoner/enc"
        );
    }

    #[test]
    fn test_riot_id_is_percent_encoded() {
        let routes = Routes::from_config(&RiotConfig::new("na1", "key")).unwrap();
        let url = routes.account_by_riot_id("Hide on bush", "K/R#1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://americas.api.riotgames.com/riot/account/v1/accounts/by-riot-id/Hide%20on%20bush/K%2FR%231"
        );
    }

    #[test]
    fn test_overridden_hosts() {
        let mut config = RiotConfig::new("euw1", "key");
        config.platform_url = Some(Url::parse("http://127.0.0.1:9000/").unwrap());
        config.regional_url = Some(Url::parse("http://127.0.0.1:9001").unwrap());
        let routes = Routes::from_config(&config).unwrap();
        assert_eq!(
            routes.summoner_me().unwrap().as_str(),
            "http://127.0.0.1:9000/lol/summoner/v4/summoners/me"
        );
        assert_eq!(
            routes.match_details("EUW1_42").unwrap().as_str(),
            "http://127.0.0.1:9001/lol/match/v5/matches/EUW1_42"
        );
    }
}
