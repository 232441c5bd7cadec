pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod executor;
pub mod metrics_defs;
pub mod routing;
pub mod types;

#[cfg(test)]
mod testutils;

pub use api::RiotApi;
pub use client::RiotClient;
pub use errors::{ApiError, ClientError, Endpoint};
