pub mod champions;
pub mod config;
pub mod errors;
pub mod fanout;
pub mod lp_delta;
pub mod metrics_defs;
pub mod orchestrator;
pub mod riot_id;
pub mod snapshots;
pub mod types;

#[cfg(test)]
mod testutils;

pub use config::ProfileConfig;
pub use errors::ProfileError;
pub use orchestrator::ProfileAggregator;
pub use riot_id::RiotId;
pub use types::AggregatedProfile;
