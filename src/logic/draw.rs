//! Draw session orchestration: stage a proposed arrangement as a Draft,
//! revise it freely, then apply it exactly once.

use crate::logic::generate::generate_bracket;
use crate::models::{
    DrawGroupAssignment, DrawId, DrawOutcome, DrawPairing, DrawPayload, DrawSession, DrawStatus,
    GenerateBracketRequest, MatchStatus, ParticipantId, ProposedAssignment, ProposedPair, StageId,
    StageKind, Tournament, TournamentError, TournamentParticipant,
};
use chrono::Utc;
use rand::Rng;
use std::collections::HashSet;
use uuid::Uuid;

/// Create a draw session in Draft state.
pub fn create_draw(
    tournament: &mut Tournament,
    payload: DrawPayload,
) -> Result<DrawId, TournamentError> {
    validate_payload_stage(tournament, &payload)?;
    let session = DrawSession::new(payload);
    let id = session.id;
    tournament.draws.push(session);
    Ok(id)
}

/// Revise a Draft session: replace the payload and/or the staged result.
/// Applied sessions are immutable history.
pub fn update_draw(
    tournament: &mut Tournament,
    draw_id: DrawId,
    payload: Option<DrawPayload>,
    result: Option<DrawOutcome>,
) -> Result<(), TournamentError> {
    if let Some(p) = &payload {
        validate_payload_stage(tournament, p)?;
    }
    let draw = tournament
        .draw_mut(draw_id)
        .ok_or(TournamentError::DrawNotFound(draw_id))?;
    if draw.status == DrawStatus::Applied {
        return Err(TournamentError::DrawAlreadyApplied);
    }
    if let Some(p) = payload {
        draw.stage_id = p.stage_id();
        draw.payload = p;
    }
    if let Some(r) = result {
        draw.result = Some(r);
    }
    Ok(())
}

/// Commit a Draft session. Dispatches on the payload type; every path
/// validates fully before its first write, so a failed apply leaves both
/// the tournament and the session untouched. On success the session
/// transitions to Applied and records its outcome.
pub fn apply_draw<R: Rng>(
    tournament: &mut Tournament,
    draw_id: DrawId,
    rng: &mut R,
) -> Result<(), TournamentError> {
    let draw = tournament
        .draw(draw_id)
        .ok_or(TournamentError::DrawNotFound(draw_id))?;
    if draw.status == DrawStatus::Applied {
        return Err(TournamentError::DrawAlreadyApplied);
    }
    let payload = draw.payload.clone();

    let outcome = match payload {
        DrawPayload::DoublesPairing { pairs } => apply_doubles(tournament, draw_id, &pairs)?,
        DrawPayload::GroupAssignment { assignments } => {
            apply_assignments(tournament, draw_id, &assignments)?
        }
        DrawPayload::KnockoutPairing { stage_id, request } => {
            apply_knockout(tournament, stage_id, &request, rng)?
        }
    };

    let draw = tournament
        .draw_mut(draw_id)
        .ok_or(TournamentError::DrawNotFound(draw_id))?;
    draw.status = DrawStatus::Applied;
    draw.result = Some(outcome);
    draw.applied_at = Some(Utc::now());
    Ok(())
}

/// A knockout payload must name an existing knockout stage.
fn validate_payload_stage(
    tournament: &Tournament,
    payload: &DrawPayload,
) -> Result<(), TournamentError> {
    if let DrawPayload::KnockoutPairing { stage_id, .. } = payload {
        let stage = tournament
            .stage(*stage_id)
            .ok_or(TournamentError::StageNotFound(*stage_id))?;
        if stage.kind != StageKind::Knockout {
            return Err(TournamentError::NotAKnockoutStage);
        }
    }
    Ok(())
}

/// Pair users into doubles teams, in seed order. A user already on a team
/// is re-paired: the stale team is removed before the new one is created.
fn apply_doubles(
    tournament: &mut Tournament,
    draw_id: DrawId,
    pairs: &[ProposedPair],
) -> Result<DrawOutcome, TournamentError> {
    let mut seen = HashSet::new();
    let mut named: Vec<(ProposedPair, String)> = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let name_a = tournament
            .user(pair.user_a)
            .ok_or(TournamentError::UserNotFound(pair.user_a))?
            .name
            .clone();
        let name_b = tournament
            .user(pair.user_b)
            .ok_or(TournamentError::UserNotFound(pair.user_b))?
            .name
            .clone();
        for uid in [pair.user_a, pair.user_b] {
            if !seen.insert(uid) {
                return Err(TournamentError::DuplicateUser(uid));
            }
        }
        named.push((pair.clone(), format!("{} / {}", name_a, name_b)));
    }

    for (i, (pair, team_name)) in named.iter().enumerate() {
        tournament
            .participants
            .retain(|p| !p.user_ids.contains(&pair.user_a) && !p.user_ids.contains(&pair.user_b));
        let participant = TournamentParticipant {
            id: Uuid::new_v4(),
            name: team_name.clone(),
            seed: Some(i as u32 + 1),
            user_ids: vec![pair.user_a, pair.user_b],
        };
        tournament.pairings.push(DrawPairing {
            draw_id,
            side_a: pair.user_a,
            side_b: pair.user_b,
            participant_id: participant.id,
        });
        tournament.participants.push(participant);
    }

    Ok(DrawOutcome::Pairings {
        pairs: pairs.to_vec(),
    })
}

/// Place participants into groups. A participant may sit in at most one
/// group per tournament.
fn apply_assignments(
    tournament: &mut Tournament,
    draw_id: DrawId,
    assignments: &[ProposedAssignment],
) -> Result<DrawOutcome, TournamentError> {
    let mut pending: HashSet<ParticipantId> = HashSet::new();
    for a in assignments {
        if tournament.group(a.group_id).is_none() {
            return Err(TournamentError::GroupNotFound(a.group_id));
        }
        if tournament.participant(a.participant_id).is_none() {
            return Err(TournamentError::ParticipantNotFound(a.participant_id));
        }
        if tournament.is_grouped(a.participant_id) || !pending.insert(a.participant_id) {
            return Err(TournamentError::ParticipantAlreadyGrouped(a.participant_id));
        }
    }

    for a in assignments {
        if let Some(group) = tournament.groups.iter_mut().find(|g| g.id == a.group_id) {
            group.members.push(a.participant_id);
        }
        tournament.group_assignments.push(DrawGroupAssignment {
            draw_id,
            group_id: a.group_id,
            participant_id: a.participant_id,
        });
    }

    Ok(DrawOutcome::Assignments {
        assignments: assignments.to_vec(),
    })
}

/// Delegate to the bracket engine, then confirm every created match as
/// scheduled. Generation already runs one resolution pass.
fn apply_knockout<R: Rng>(
    tournament: &mut Tournament,
    stage_id: StageId,
    request: &GenerateBracketRequest,
    rng: &mut R,
) -> Result<DrawOutcome, TournamentError> {
    let entrants = generate_bracket(tournament, stage_id, request, rng)?;
    for m in tournament
        .matches
        .iter_mut()
        .filter(|m| m.stage_id == stage_id)
    {
        m.status = MatchStatus::Scheduled;
    }
    Ok(DrawOutcome::EntrantOrder {
        participant_ids: entrants.iter().map(|e| e.participant_id).collect(),
    })
}
