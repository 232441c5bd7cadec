use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_COMMUNITY_DRAGON_URL: &str = "https://raw.communitydragon.org/latest/plugins/rcp-be-lol-game-data/global/default/v1/profile-icons";
const DEFAULT_USER_AGENT: &str = "summoner-api/0.1";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Platform region cannot be empty")]
    EmptyPlatform,

    #[error("Retry policy must allow at least one attempt")]
    NoAttempts,

    #[error("Jitter range is empty: min {min_ms}ms must be below max {max_ms}ms")]
    InvalidJitter { min_ms: u64, max_ms: u64 },

    #[error("Timeouts must be greater than zero")]
    ZeroTimeout,

    #[error("Cache {0} must allow at least one entry")]
    ZeroCacheCapacity(&'static str),
}

/// Upstream API client configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RiotConfig {
    /// Static API key sent as `X-Riot-Token`. May be left empty in the file
    /// and supplied through `RIOT_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    /// Platform routing value, e.g. "euw1"
    pub platform: String,
    /// Overrides the platform host (summoner, league endpoints)
    #[serde(default)]
    pub platform_url: Option<Url>,
    /// Overrides the regional host (account, match endpoints)
    #[serde(default)]
    pub regional_url: Option<Url>,
    #[serde(default = "default_community_dragon_url")]
    pub community_dragon_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub caches: CachesConfig,
}

fn default_community_dragon_url() -> String {
    DEFAULT_COMMUNITY_DRAGON_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl RiotConfig {
    pub fn new(platform: &str, api_key: &str) -> Self {
        RiotConfig {
            api_key: api_key.to_string(),
            platform: platform.to_string(),
            platform_url: None,
            regional_url: None,
            community_dragon_url: default_community_dragon_url(),
            user_agent: default_user_agent(),
            retry: RetryPolicy::default(),
            timeouts: Timeouts::default(),
            caches: CachesConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.platform.trim().is_empty() {
            return Err(ValidationError::EmptyPlatform);
        }
        self.retry.validate()?;
        self.timeouts.validate()?;
        self.caches.validate()
    }

    /// True when the key is missing or still the documented placeholder.
    pub fn has_placeholder_key(&self) -> bool {
        let key = self.api_key.trim();
        key.is_empty() || key.eq_ignore_ascii_case("YOUR_API_KEY")
    }
}

/// Retry and backoff policy of the request executor.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    /// Lower bound applied to server supplied `Retry-After` hints
    pub min_retry_after_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 2000,
            jitter_min_ms: 100,
            jitter_max_ms: 400,
            min_retry_after_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::NoAttempts);
        }
        if self.jitter_min_ms >= self.jitter_max_ms {
            return Err(ValidationError::InvalidJitter {
                min_ms: self.jitter_min_ms,
                max_ms: self.jitter_max_ms,
            });
        }
        Ok(())
    }

    /// The deterministic part of the delay before attempt `attempt + 1`:
    /// `base * 2^(attempt - 1)`.
    pub fn exponential_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << exponent))
    }

    /// Delay to wait after failed attempt `attempt` (1-based) before the next one.
    pub fn backoff_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint.max(Duration::from_millis(self.min_retry_after_ms));
        }

        let jitter = rand::rng().random_range(self.jitter_min_ms..self.jitter_max_ms);
        self.exponential_delay(attempt) + Duration::from_millis(jitter)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Timeouts {
    pub connect_secs: u64,
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            connect_secs: 10,
            request_secs: 15,
        }
    }
}

impl Timeouts {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.connect_secs == 0 || self.request_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Which access resets an entry's lifetime.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpireAfter {
    Write,
    Access,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CachePolicy {
    pub expire_after: ExpireAfter,
    pub ttl_secs: u64,
    pub max_entries: u64,
}

impl CachePolicy {
    pub const fn after_write(ttl_secs: u64, max_entries: u64) -> Self {
        CachePolicy {
            expire_after: ExpireAfter::Write,
            ttl_secs,
            max_entries,
        }
    }

    pub const fn after_access(ttl_secs: u64, max_entries: u64) -> Self {
        CachePolicy {
            expire_after: ExpireAfter::Access,
            ttl_secs,
            max_entries,
        }
    }
}

/// One policy per endpoint class.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CachesConfig {
    pub accounts: CachePolicy,
    pub summoners: CachePolicy,
    pub league_entries: CachePolicy,
    pub match_ids: CachePolicy,
    pub match_details: CachePolicy,
}

impl Default for CachesConfig {
    fn default() -> Self {
        CachesConfig {
            accounts: CachePolicy::after_write(60 * 60, 100),
            summoners: CachePolicy::after_write(60 * 60, 100),
            league_entries: CachePolicy::after_write(5 * 60, 200),
            match_ids: CachePolicy::after_access(10 * 60, 500),
            match_details: CachePolicy::after_write(30 * 60, 1000),
        }
    }
}

impl CachesConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, policy) in [
            ("accounts", &self.accounts),
            ("summoners", &self.summoners),
            ("league_entries", &self.league_entries),
            ("match_ids", &self.match_ids),
            ("match_details", &self.match_details),
        ] {
            if policy.max_entries == 0 {
                return Err(ValidationError::ZeroCacheCapacity(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
api_key: RGAPI-test
platform: euw1
"#;
        let config: RiotConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.timeouts.connect_secs, 10);
        assert_eq!(config.timeouts.request_secs, 15);
        assert_eq!(config.caches, CachesConfig::default());
        assert_eq!(config.caches.match_ids.expire_after, ExpireAfter::Access);
        assert!(!config.has_placeholder_key());
    }

    #[test]
    fn test_parse_overrides() {
        let yaml = r#"
platform: na1
regional_url: "http://127.0.0.1:8080"
retry:
    max_attempts: 5
caches:
    match_details:
        expire_after: access
        ttl_secs: 60
        max_entries: 10
"#;
        let config: RiotConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert_eq!(
            config.caches.match_details,
            CachePolicy::after_access(60, 10)
        );
        assert_eq!(config.caches.accounts, CachePolicy::after_write(3600, 100));
        assert_eq!(
            config.regional_url.as_ref().unwrap().as_str(),
            "http://127.0.0.1:8080/"
        );
        assert!(config.has_placeholder_key());
    }

    #[test]
    fn test_validation_errors() {
        let base = RiotConfig::new("euw1", "RGAPI-test");

        let mut config = base.clone();
        config.platform = " ".into();
        assert_eq!(config.validate(), Err(ValidationError::EmptyPlatform));

        let mut config = base.clone();
        config.retry.max_attempts = 0;
        assert_eq!(config.validate(), Err(ValidationError::NoAttempts));

        let mut config = base.clone();
        config.retry.jitter_min_ms = 400;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidJitter { .. })
        ));

        let mut config = base.clone();
        config.timeouts.request_secs = 0;
        assert_eq!(config.validate(), Err(ValidationError::ZeroTimeout));

        let mut config = base;
        config.caches.league_entries.max_entries = 0;
        assert_eq!(
            config.validate(),
            Err(ValidationError::ZeroCacheCapacity("league_entries"))
        );

        assert!(RiotConfig::new("euw1", "YOUR_API_KEY").has_placeholder_key());
    }

    #[test]
    fn test_exponential_backoff_is_non_decreasing() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.exponential_delay(1), Duration::from_secs(2));
        assert_eq!(policy.exponential_delay(2), Duration::from_secs(4));
        assert_eq!(policy.exponential_delay(3), Duration::from_secs(8));

        let mut previous = Duration::ZERO;
        for attempt in 1..10 {
            let delay = policy.exponential_delay(attempt);
            assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn test_backoff_jitter_range() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.backoff_delay(1, None);
            assert!(delay >= Duration::from_millis(2100));
            assert!(delay < Duration::from_millis(2400));
        }
    }

    #[test]
    fn test_retry_after_floor() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff_delay(1, Some(Duration::ZERO)),
            Duration::from_secs(1)
        );
        assert_eq!(
            policy.backoff_delay(2, Some(Duration::from_secs(7))),
            Duration::from_secs(7)
        );
        // The hint replaces the exponential schedule entirely
        assert_eq!(
            policy.backoff_delay(3, Some(Duration::from_secs(1))),
            Duration::from_secs(1)
        );
    }
}
