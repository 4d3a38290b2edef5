//! Bracket resolution: fill still-empty match sides whose declared source
//! has become available. Idempotent; safe to call any number of times.

use crate::models::{
    MatchId, ParticipantId, Side, SlotSource, StageId, Tournament, TournamentError,
};

/// Run one resolution pass over every slot of the stage. Returns the number
/// of sides newly filled.
///
/// A slot whose target side already has members is skipped, so membership
/// is written exactly once and never replaced. Slots whose source is not
/// yet available (standings not finalized, upstream match undecided) are
/// left alone and retried on the next call.
pub fn resolve_bracket(
    tournament: &mut Tournament,
    stage_id: StageId,
) -> Result<u32, TournamentError> {
    if tournament.stage(stage_id).is_none() {
        return Err(TournamentError::StageNotFound(stage_id));
    }

    // Plan from the immutable aggregate first, then apply. Winner slots
    // depend on `is_winner`, which this pass never sets, so a single flat
    // pass is complete.
    let mut planned: Vec<(MatchId, Side, Vec<ParticipantId>)> = Vec::new();
    for slot in &tournament.slots {
        let target = match tournament.match_by_id(slot.target_match_id) {
            Some(m) if m.stage_id == stage_id => m,
            _ => continue,
        };
        if !target.side(slot.target_side).members.is_empty() {
            continue;
        }
        let members = match slot.source {
            SlotSource::Seed { seed } => tournament
                .participant_by_seed(seed)
                .map(|p| vec![p.id]),
            SlotSource::GroupRank { group_id, rank } => tournament
                .standings
                .iter()
                .find(|s| s.group_id == group_id && s.rank == Some(rank))
                .map(|s| vec![s.participant_id]),
            SlotSource::MatchWinner { match_id } => tournament
                .match_by_id(match_id)
                .and_then(|m| m.winner_side())
                .map(|side| side.members.clone()),
        };
        if let Some(members) = members {
            if !members.is_empty() {
                planned.push((slot.target_match_id, slot.target_side, members));
            }
        }
    }

    let mut resolved = 0;
    for (match_id, side, members) in planned {
        if let Some(m) = tournament.match_mut(match_id) {
            let target = m.side_mut(side);
            if target.members.is_empty() {
                target.members = members;
                resolved += 1;
            }
        }
    }
    Ok(resolved)
}
