use indexmap::IndexMap;
use riot_client::types::MatchSummary;

/// Games played per champion by `puuid`, most played first. Ties are ordered
/// by champion name.
pub fn champion_play_counts(matches: &[MatchSummary], puuid: &str) -> IndexMap<String, u32> {
    let mut counts: IndexMap<String, u32> = IndexMap::new();
    for summary in matches {
        if let Some(participant) = summary.participant(puuid)
            && !participant.champion_name.trim().is_empty()
        {
            *counts.entry(participant.champion_name.clone()).or_default() += 1;
        }
    }

    counts.sort_by(|name_a, count_a, name_b, count_b| {
        count_b.cmp(count_a).then_with(|| name_a.cmp(name_b))
    });
    counts
}
