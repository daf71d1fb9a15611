use tracing::debug;

use crate::fuzz::{partial_ratio, ratio};
use crate::index::{split_key, CollegeIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matched_key: String,
    pub url: String,
    pub score: f64,
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Score a normalized query against one index key as (partial ratio, full
/// ratio) of its best-scoring form; the full ratio only breaks ties.
///
/// The key's display name is always compared. The parenthetical part is only
/// compared when the query is no longer than it, which lets abbreviations hit
/// without letting a short alias match every query that contains it.
fn rank_key(query: &str, key: &str) -> (f64, f64) {
    let (name, alias) = split_key(key);
    let name = name.to_lowercase();
    let mut best = (partial_ratio(query, &name), ratio(query, &name));

    if let Some(alias) = alias.filter(|a| query.chars().count() <= a.chars().count()) {
        let alias = alias.to_lowercase();
        let candidate = (partial_ratio(query, &alias), ratio(query, &alias));
        if candidate > best {
            best = candidate;
        }
    }
    best
}

/// Highest-scoring key regardless of threshold. Remaining ties keep the first
/// key in index order.
pub fn best_candidate(query: &str, index: &CollegeIndex) -> Option<MatchResult> {
    let query = normalize_query(query);
    if query.is_empty() {
        return None;
    }

    let mut best: Option<(MatchResult, f64)> = None;
    for (key, url) in index.iter() {
        let (score, tiebreak) = rank_key(&query, key);
        let better = match &best {
            Some((b, b_tie)) => (score, tiebreak) > (b.score, *b_tie),
            None => true,
        };
        if better {
            let m = MatchResult {
                matched_key: key.to_string(),
                url: url.to_string(),
                score,
            };
            best = Some((m, tiebreak));
        }
    }
    best.map(|(m, _)| m)
}

/// Resolve free text to a single index entry, or `None` below `threshold`.
pub fn find_best_match(query: &str, index: &CollegeIndex, threshold: f64) -> Option<MatchResult> {
    let best = best_candidate(query, index)?;
    debug!(
        "Input {:?} -> {:?} (score {:.1})",
        normalize_query(query),
        best.matched_key,
        best.score
    );
    (best.score >= threshold).then_some(best)
}
