//! Derives per-match LP changes from the snapshots bracketing each match.
//!
//! For a ranked match ending at `T`, the latest snapshot strictly before `T`
//! and the earliest snapshot at or after `T` are compared. The difference in
//! league points is only meaningful inside one division, so a tier or rank
//! change between the two leaves the match without a value.
use crate::metrics_defs::LP_CORRELATION;
use crate::snapshots::{LpSnapshot, SnapshotStore};
use riot_client::types::MatchSummary;
use shared::counter;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LpOutcome {
    Computed(i32),
    /// Not a tracked ranked queue.
    Unranked,
    /// No snapshot on one side of the match.
    InsufficientHistory,
    /// The "after" snapshot predates the match end.
    Inconsistent,
    /// Tier or rank differ between the two snapshots.
    DivisionChanged,
    StoreFailure,
}

impl LpOutcome {
    pub fn lp_change(&self) -> Option<i32> {
        match self {
            LpOutcome::Computed(delta) => Some(*delta),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LpOutcome::Computed(_) => "computed",
            LpOutcome::Unranked => "unranked",
            LpOutcome::InsufficientHistory => "unknown",
            LpOutcome::Inconsistent => "inconsistent",
            LpOutcome::DivisionChanged => "rank_changed",
            LpOutcome::StoreFailure => "store_failure",
        }
    }
}

/// Compares the two snapshots around a match that ended at `match_end`.
pub fn lp_delta(
    before: Option<&LpSnapshot>,
    after: Option<&LpSnapshot>,
    match_end: i64,
) -> LpOutcome {
    let (Some(before), Some(after)) = (before, after) else {
        return LpOutcome::InsufficientHistory;
    };
    if after.timestamp < match_end {
        return LpOutcome::Inconsistent;
    }
    if !before.same_division(after) {
        return LpOutcome::DivisionChanged;
    }
    LpOutcome::Computed(after.league_points - before.league_points)
}

/// Sets `lp_change` on every ranked match in `matches`, in list order.
/// Matches whose change cannot be derived are left as `None`.
pub fn correlate(store: &dyn SnapshotStore, puuid: &str, matches: &mut [MatchSummary]) {
    for summary in matches.iter_mut() {
        let outcome = correlate_one(store, puuid, summary);
        summary.lp_change = outcome.lp_change();
        if outcome != LpOutcome::Unranked {
            counter!(LP_CORRELATION, "outcome" => outcome.as_str()).increment(1);
        }
    }
}

fn correlate_one(store: &dyn SnapshotStore, puuid: &str, summary: &MatchSummary) -> LpOutcome {
    let Some(queue) = summary.ranked_queue() else {
        return LpOutcome::Unranked;
    };
    let match_end = summary.game_end_timestamp;

    let neighbours = store
        .latest_before(puuid, queue, match_end)
        .and_then(|before| Ok((before, store.earliest_at_or_after(puuid, queue, match_end)?)));
    let (before, after) = match neighbours {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(
                match_id = %summary.match_id,
                puuid,
                error = %e,
                "Failed to read LP snapshots"
            );
            return LpOutcome::StoreFailure;
        }
    };

    let outcome = lp_delta(before.as_ref(), after.as_ref(), match_end);
    match (&outcome, &before, &after) {
        (LpOutcome::DivisionChanged, Some(before), Some(after)) => tracing::warn!(
            match_id = %summary.match_id,
            puuid,
            queue = %queue,
            from = %format_args!("{} {}", before.tier, before.rank),
            to = %format_args!("{} {}", after.tier, after.rank),
            "Division changed across match, LP change unknown"
        ),
        (LpOutcome::Inconsistent, _, Some(after)) => tracing::warn!(
            match_id = %summary.match_id,
            puuid,
            match_end,
            snapshot_timestamp = after.timestamp,
            "LP snapshot after match predates match end"
        ),
        (LpOutcome::InsufficientHistory, _, _) => tracing::debug!(
            match_id = %summary.match_id,
            puuid,
            queue = %queue,
            "No LP snapshots around match"
        ),
        _ => {}
    }
    outcome
}
