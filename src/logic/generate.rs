//! Bracket generation (one pass per stage) and the read-only projection.

use crate::logic::entrants::{resolve_entrants, Entrant};
use crate::logic::resolve::resolve_bracket;
use crate::logic::slots::assign_slots;
use crate::logic::tree::build_tree;
use crate::models::{
    GenerateBracketRequest, MatchId, MatchStatus, ParticipantId, Side, SlotSource, StageId,
    StageKind, Tournament, TournamentError,
};
use rand::Rng;
use serde::Serialize;

/// Generate the bracket for a knockout stage: resolve entrants, build the
/// skeleton, wire the slots, then run one resolution pass so deterministic
/// sources fill immediately. Returns the resolved entrant order.
///
/// A stage gets exactly one generation pass; any existing match on the
/// stage rejects the call. All validation happens before any write, so a
/// failed call leaves the tournament untouched.
pub fn generate_bracket<R: Rng>(
    tournament: &mut Tournament,
    stage_id: StageId,
    request: &GenerateBracketRequest,
    rng: &mut R,
) -> Result<Vec<Entrant>, TournamentError> {
    let stage = tournament
        .stage(stage_id)
        .ok_or(TournamentError::StageNotFound(stage_id))?;
    if stage.kind != StageKind::Knockout {
        return Err(TournamentError::NotAKnockoutStage);
    }
    if tournament.stage_matches(stage_id).next().is_some() {
        return Err(TournamentError::StageAlreadyGenerated);
    }

    let (entrants, size) = resolve_entrants(
        tournament,
        &request.source,
        request.size,
        request.seed_order,
        rng,
    )?;

    let matches = build_tree(stage_id, size, request.best_of);
    let slots = assign_slots(&matches, &entrants);
    tournament.matches.extend(matches);
    tournament.slots.extend(slots);

    resolve_bracket(tournament, stage_id)?;
    Ok(entrants)
}

/// One member of a match side, with its display name.
#[derive(Clone, Debug, Serialize)]
pub struct MemberView {
    pub participant_id: ParticipantId,
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SideView {
    pub side: Side,
    pub is_winner: bool,
    pub members: Vec<MemberView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MatchView {
    pub id: MatchId,
    pub round_no: u32,
    pub match_no: u32,
    pub best_of: u32,
    pub status: MatchStatus,
    pub sides: Vec<SideView>,
}

/// A slot with its resolution state, for rendering.
#[derive(Clone, Debug, Serialize)]
pub struct SlotView {
    pub match_id: MatchId,
    pub round_no: u32,
    pub match_no: u32,
    pub side: Side,
    pub source: SlotSource,
    pub resolved: bool,
    /// Display name(s) occupying the target side once resolved.
    pub participant: Option<String>,
}

/// Read-only projection of a stage's bracket.
#[derive(Clone, Debug, Serialize)]
pub struct BracketView {
    pub stage_id: StageId,
    pub matches: Vec<MatchView>,
    pub slots: Vec<SlotView>,
}

/// Project the bracket of a stage for rendering: matches with member names,
/// slots with their resolved flag.
pub fn get_bracket(
    tournament: &Tournament,
    stage_id: StageId,
) -> Result<BracketView, TournamentError> {
    if tournament.stage(stage_id).is_none() {
        return Err(TournamentError::StageNotFound(stage_id));
    }

    let display_name = |id: ParticipantId| {
        tournament
            .participant(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let matches: Vec<MatchView> = tournament
        .stage_matches(stage_id)
        .map(|m| MatchView {
            id: m.id,
            round_no: m.round_no,
            match_no: m.match_no,
            best_of: m.best_of,
            status: m.status,
            sides: m
                .sides
                .iter()
                .map(|s| SideView {
                    side: s.side,
                    is_winner: s.is_winner,
                    members: s
                        .members
                        .iter()
                        .map(|&id| MemberView {
                            participant_id: id,
                            name: display_name(id),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    let slots: Vec<SlotView> = tournament
        .slots
        .iter()
        .filter_map(|slot| {
            let m = tournament.match_by_id(slot.target_match_id)?;
            if m.stage_id != stage_id {
                return None;
            }
            let members = &m.side(slot.target_side).members;
            let resolved = !members.is_empty();
            let participant = if resolved {
                Some(
                    members
                        .iter()
                        .map(|&id| display_name(id))
                        .collect::<Vec<_>>()
                        .join(" / "),
                )
            } else {
                None
            };
            Some(SlotView {
                match_id: m.id,
                round_no: m.round_no,
                match_no: m.match_no,
                side: slot.target_side,
                source: slot.source.clone(),
                resolved,
                participant,
            })
        })
        .collect();

    Ok(BracketView {
        stage_id,
        matches,
        slots,
    })
}
