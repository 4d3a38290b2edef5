//! Slot assignment: wire the skeleton to entrants (round 1) and to earlier
//! matches (winner forwarding, rounds 2 and up).

use crate::logic::entrants::{Entrant, EntrantOrigin};
use crate::models::{BracketMatch, BracketSlot, Side, SlotSource};

/// Write one slot per fillable match side.
///
/// Round 1: entrants are consumed two at a time in tree order; entrant `2k`
/// and `2k+1` (0-indexed) become side A and B of round-1 match `k+1`. A
/// side with no entrant gets no slot at all: that is a bye, and resolution
/// will never fill it.
///
/// Rounds >= 2: match `i` (0-indexed within its round) receives two
/// winner-forwarding slots pointing at matches `2i` and `2i+1` of the round
/// below. The tree shape alone encodes the dependency graph.
pub fn assign_slots(matches: &[BracketMatch], entrants: &[Entrant]) -> Vec<BracketSlot> {
    let mut by_round: Vec<Vec<&BracketMatch>> = Vec::new();
    for m in matches {
        let idx = m.round_no as usize - 1;
        if by_round.len() <= idx {
            by_round.resize_with(idx + 1, Vec::new);
        }
        by_round[idx].push(m);
    }

    let mut slots = Vec::new();

    if let Some(first_round) = by_round.first() {
        for (k, m) in first_round.iter().enumerate() {
            for (offset, side) in [(0, Side::A), (1, Side::B)] {
                if let Some(entrant) = entrants.get(2 * k + offset) {
                    slots.push(BracketSlot {
                        target_match_id: m.id,
                        target_side: side,
                        source: entrant_source(entrant),
                    });
                }
            }
        }
    }

    for r in 1..by_round.len() {
        for (i, m) in by_round[r].iter().enumerate() {
            for (offset, side) in [(0, Side::A), (1, Side::B)] {
                slots.push(BracketSlot {
                    target_match_id: m.id,
                    target_side: side,
                    source: SlotSource::MatchWinner {
                        match_id: by_round[r - 1][2 * i + offset].id,
                    },
                });
            }
        }
    }

    slots
}

fn entrant_source(entrant: &Entrant) -> SlotSource {
    match entrant.origin {
        EntrantOrigin::Position(seed) => SlotSource::Seed { seed },
        EntrantOrigin::GroupRank { group_id, rank } => SlotSource::GroupRank { group_id, rank },
    }
}
