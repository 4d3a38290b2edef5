//! Entrant resolution: turn a sourcing strategy into an ordered entrant list
//! and a validated bracket size.

use crate::models::{
    EntrantSource, GroupId, ParticipantId, SeedOrder, StageId, StageKind, Tournament,
    TournamentError,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Where an entrant came from; determines the slot kind written for it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntrantOrigin {
    /// 1-based position in the final entrant order; becomes a seed slot.
    Position(u32),
    /// Ranked group outcome; becomes a group-rank slot.
    GroupRank { group_id: GroupId, rank: u32 },
}

/// One entrant in bracket order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entrant {
    pub participant_id: ParticipantId,
    pub origin: EntrantOrigin,
}

/// Resolve an entrant source into an ordered list and a bracket size.
///
/// Side effect: for Custom/Random sources, participant seeds are persisted
/// as 1..N over the final order (numbered back-to-front for
/// `SeedOrder::Reverse`). All validation happens before any write.
pub fn resolve_entrants<R: Rng>(
    tournament: &mut Tournament,
    source: &EntrantSource,
    size: Option<u32>,
    seed_order: SeedOrder,
    rng: &mut R,
) -> Result<(Vec<Entrant>, u32), TournamentError> {
    match source {
        EntrantSource::Custom { pairs } => {
            let mut seen = HashSet::new();
            for pair in pairs {
                for id in [pair.side_a, pair.side_b] {
                    if tournament.participant(id).is_none() {
                        return Err(TournamentError::ParticipantNotFound(id));
                    }
                    if !seen.insert(id) {
                        return Err(TournamentError::DuplicateParticipant(id));
                    }
                }
            }
            let ids: Vec<ParticipantId> = pairs
                .iter()
                .flat_map(|p| [p.side_a, p.side_b])
                .collect();
            if ids.is_empty() {
                return Err(TournamentError::NoEntrants);
            }
            let size = resolve_size(ids.len(), size)?;
            persist_seeds(tournament, &ids, seed_order);
            Ok((positional_entrants(ids), size))
        }
        EntrantSource::Random => {
            if tournament.participants.is_empty() {
                return Err(TournamentError::NoParticipants);
            }
            if let Some(s) = size {
                if !s.is_power_of_two() {
                    return Err(TournamentError::SizeNotPowerOfTwo(s));
                }
            }
            let mut ids: Vec<ParticipantId> =
                tournament.participants.iter().map(|p| p.id).collect();
            ids.shuffle(rng);
            if let Some(s) = size {
                ids.truncate(s as usize);
            }
            let size = resolve_size(ids.len(), size)?;
            persist_seeds(tournament, &ids, seed_order);
            Ok((positional_entrants(ids), size))
        }
        EntrantSource::GroupRank {
            source_stage_id,
            top_n_per_group,
            wildcard_count,
        } => {
            let entrants =
                group_rank_entrants(tournament, *source_stage_id, *top_n_per_group, *wildcard_count)?;
            let size = resolve_size(entrants.len(), size)?;
            Ok((entrants, size))
        }
    }
}

/// Smallest power of two that fits `count`, or the explicitly given size
/// after validating it is a power of two and large enough.
fn resolve_size(count: usize, explicit: Option<u32>) -> Result<u32, TournamentError> {
    if count == 0 {
        return Err(TournamentError::NoEntrants);
    }
    match explicit {
        Some(size) => {
            if !size.is_power_of_two() {
                return Err(TournamentError::SizeNotPowerOfTwo(size));
            }
            if (size as usize) < count {
                return Err(TournamentError::SizeTooSmall {
                    size,
                    entrants: count,
                });
            }
            Ok(size)
        }
        None => Ok((count as u32).next_power_of_two()),
    }
}

/// Persist seeds 1..N over the entrant order. Existing seeds are cleared
/// first so a previous draw cannot leave stale duplicates behind.
fn persist_seeds(tournament: &mut Tournament, ids: &[ParticipantId], order: SeedOrder) {
    for p in &mut tournament.participants {
        p.seed = None;
    }
    let n = ids.len() as u32;
    for (i, id) in ids.iter().enumerate() {
        let seed = match order {
            SeedOrder::Normal => i as u32 + 1,
            SeedOrder::Reverse => n - i as u32,
        };
        if let Some(p) = tournament.participants.iter_mut().find(|p| p.id == *id) {
            p.seed = Some(seed);
        }
    }
}

fn positional_entrants(ids: Vec<ParticipantId>) -> Vec<Entrant> {
    ids.into_iter()
        .enumerate()
        .map(|(i, participant_id)| Entrant {
            participant_id,
            origin: EntrantOrigin::Position(i as u32 + 1),
        })
        .collect()
}

/// Top `top_n` ranked finishers of every group of the source stage, in group
/// order, then up to `wildcard_count` more from the remaining ranked pool.
fn group_rank_entrants(
    tournament: &Tournament,
    source_stage_id: StageId,
    top_n: u32,
    wildcard_count: u32,
) -> Result<Vec<Entrant>, TournamentError> {
    let stage = tournament
        .stage(source_stage_id)
        .ok_or(TournamentError::StageNotFound(source_stage_id))?;
    if stage.kind != StageKind::Group {
        return Err(TournamentError::NotAGroupStage);
    }
    let groups: Vec<_> = tournament
        .groups
        .iter()
        .filter(|g| g.stage_id == source_stage_id)
        .collect();
    if groups.is_empty() {
        return Err(TournamentError::NoGroupsInStage(source_stage_id));
    }

    let mut entrants = Vec::new();
    let mut remainder = Vec::new();
    for group in &groups {
        // Ranked rows only; rank is None until the group is finalized.
        let mut ranked: Vec<(u32, i32, ParticipantId)> = tournament
            .standings
            .iter()
            .filter(|s| s.group_id == group.id)
            .filter_map(|s| s.rank.map(|r| (r, s.match_points, s.participant_id)))
            .collect();
        if ranked.len() < top_n as usize {
            return Err(TournamentError::StandingsIncomplete {
                group_id: group.id,
                ranked: ranked.len(),
                needed: top_n as usize,
            });
        }
        ranked.sort_by_key(|&(rank, points, _)| (rank, -points));
        for &(rank, _, participant_id) in ranked.iter().take(top_n as usize) {
            entrants.push(Entrant {
                participant_id,
                origin: EntrantOrigin::GroupRank {
                    group_id: group.id,
                    rank,
                },
            });
        }
        for &(rank, points, participant_id) in ranked.iter().skip(top_n as usize) {
            remainder.push((rank, points, group.id, participant_id));
        }
    }

    remainder.sort_by_key(|&(rank, points, _, _)| (rank, -points));
    for &(rank, _, group_id, participant_id) in remainder.iter().take(wildcard_count as usize) {
        entrants.push(Entrant {
            participant_id,
            origin: EntrantOrigin::GroupRank { group_id, rank },
        });
    }

    Ok(entrants)
}
