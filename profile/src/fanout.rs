use crate::metrics_defs::MATCH_DETAILS_DROPPED;
use riot_client::RiotApi;
use riot_client::types::MatchSummary;
use shared::counter;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Fetches match details in bounded concurrent batches.
///
/// A batch starts only after every request of the previous batch settled, so
/// at most `batch_size` detail requests are ever in flight. Results keep the
/// input order. Details that fail or are missing are logged and dropped.
#[derive(Clone)]
pub struct BatchFetcher {
    api: Arc<dyn RiotApi>,
    batch_size: usize,
}

impl BatchFetcher {
    pub fn new(api: Arc<dyn RiotApi>, batch_size: usize) -> Self {
        BatchFetcher {
            api,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn fetch_match_details(&self, match_ids: &[String]) -> Vec<MatchSummary> {
        let mut results = Vec::with_capacity(match_ids.len());

        for batch in match_ids.chunks(self.batch_size) {
            let mut join_set = JoinSet::new();

            for (position, match_id) in batch.iter().enumerate() {
                let api = self.api.clone();
                let match_id = match_id.clone();
                join_set.spawn(async move {
                    let result = api.match_details(&match_id).await;
                    (position, match_id, result)
                });
            }

            let mut fetched = Vec::with_capacity(batch.len());
            while let Some(join_result) = join_set.join_next().await {
                match join_result {
                    Ok((position, _, Ok(Some(summary)))) => fetched.push((position, summary)),
                    Ok((_, match_id, Ok(None))) => {
                        counter!(MATCH_DETAILS_DROPPED, "reason" => "not_found").increment(1);
                        tracing::warn!(match_id = %match_id, "Match details not found, skipping");
                    }
                    Ok((_, match_id, Err(e))) => {
                        counter!(MATCH_DETAILS_DROPPED, "reason" => e.kind()).increment(1);
                        tracing::error!(match_id = %match_id, error = %e, "Error fetching match details");
                    }
                    Err(e) => {
                        counter!(MATCH_DETAILS_DROPPED, "reason" => "panic").increment(1);
                        tracing::error!("Task panicked: {}", e);
                    }
                }
            }

            fetched.sort_by_key(|(position, _)| *position);
            results.extend(fetched.into_iter().map(|(_, summary)| summary));
        }

        results
    }
}
