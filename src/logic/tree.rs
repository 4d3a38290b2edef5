//! Bracket tree builder: the round/match skeleton, independent of entrants.

use crate::models::{BracketMatch, StageId};

/// Build the full match skeleton for a bracket of `size` (a validated power
/// of two): `log2(size)` rounds, round `r` holding `size / 2^r` matches
/// numbered 1..count, each with two empty sides.
///
/// Matches are produced round-major, match-number-major. This order is
/// load-bearing: slot assignment derives round-to-round adjacency from
/// positions, not ids.
pub fn build_tree(stage_id: StageId, size: u32, best_of: u32) -> Vec<BracketMatch> {
    debug_assert!(size.is_power_of_two());
    let rounds = size.trailing_zeros();
    let mut matches = Vec::with_capacity(size.saturating_sub(1) as usize);
    for round_no in 1..=rounds {
        let count = size >> round_no;
        for match_no in 1..=count {
            matches.push(BracketMatch::new(stage_id, round_no, match_no, best_of));
        }
    }
    matches
}
