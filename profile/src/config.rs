use serde::Deserialize;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("match_count must be between 1 and 100")]
    MatchCountOutOfRange,
    #[error("fanout batch_size must be greater than zero")]
    ZeroBatchSize,
    #[error("snapshot file path must not be empty")]
    EmptySnapshotPath,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SnapshotStoreConfig {
    #[default]
    Memory,
    File { path: PathBuf },
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FanoutConfig {
    /// Maximum match-detail requests in flight at once.
    pub batch_size: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        FanoutConfig { batch_size: 5 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileConfig {
    /// Number of recent match ids requested per profile.
    pub match_count: u32,
    pub fanout: FanoutConfig,
    pub snapshots: SnapshotStoreConfig,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            match_count: 20,
            fanout: FanoutConfig::default(),
            snapshots: SnapshotStoreConfig::default(),
        }
    }
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        // match-v5 caps `count` at 100
        if !(1..=100).contains(&self.match_count) {
            return Err(ValidationError::MatchCountOutOfRange);
        }
        if self.fanout.batch_size == 0 {
            return Err(ValidationError::ZeroBatchSize);
        }
        if let SnapshotStoreConfig::File { path } = &self.snapshots
            && path.as_os_str().is_empty()
        {
            return Err(ValidationError::EmptySnapshotPath);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: ProfileConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ProfileConfig::default());
        assert_eq!(config.match_count, 20);
        assert_eq!(config.fanout.batch_size, 5);
        assert_eq!(config.snapshots, SnapshotStoreConfig::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_store() {
        let yaml = r#"
            match_count: 10
            fanout:
                batch_size: 3
            snapshots:
                type: file
                path: /var/lib/summoner/snapshots.jsonl
        "#;
        let config: ProfileConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.match_count, 10);
        assert_eq!(config.fanout.batch_size, 3);
        assert_eq!(
            config.snapshots,
            SnapshotStoreConfig::File {
                path: PathBuf::from("/var/lib/summoner/snapshots.jsonl")
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = ProfileConfig {
            match_count: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::MatchCountOutOfRange));

        config.match_count = 20;
        config.fanout.batch_size = 0;
        assert_eq!(config.validate(), Err(ValidationError::ZeroBatchSize));

        config.fanout.batch_size = 5;
        config.snapshots = SnapshotStoreConfig::File {
            path: PathBuf::new(),
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptySnapshotPath));
    }
}
