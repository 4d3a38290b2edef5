//! Integration tests for bracket generation and resolution: tree shape,
//! slot wiring, winner forwarding, and validation.

use club_bracket_web::{
    build_tree, generate_bracket, get_bracket, resolve_bracket, resolve_entrants, CustomPair,
    EntrantSource, GenerateBracketRequest, GroupStanding, MatchStatus, ParticipantId, SeedOrder,
    Side, SlotSource, StageId, StageKind, Tournament, TournamentError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

fn tournament_with_participants(n: usize) -> (Tournament, Vec<ParticipantId>, StageId) {
    let mut t = Tournament::new("Club Open");
    let ids: Vec<ParticipantId> = (0..n)
        .map(|i| t.add_participant(format!("P{i}"), vec![]).unwrap())
        .collect();
    let stage_id = t.add_stage("Knockout", StageKind::Knockout);
    (t, ids, stage_id)
}

fn custom_request(ids: &[ParticipantId]) -> GenerateBracketRequest {
    let pairs = ids
        .chunks(2)
        .map(|c| CustomPair {
            side_a: c[0],
            side_b: c[1],
        })
        .collect();
    GenerateBracketRequest::new(EntrantSource::Custom { pairs })
}

#[test]
fn build_tree_produces_full_skeleton() {
    for k in 1..=4u32 {
        let size = 1u32 << k;
        let matches = build_tree(Uuid::new_v4(), size, 3);
        assert_eq!(matches.len(), (size - 1) as usize);
        for r in 1..=k {
            let in_round = matches.iter().filter(|m| m.round_no == r).count();
            assert_eq!(in_round, (size >> r) as usize);
        }
        for m in &matches {
            assert_eq!(m.status, MatchStatus::Scheduled);
            assert_eq!(m.best_of, 3);
            assert!(m.sides.iter().all(|s| s.members.is_empty() && !s.is_winner));
        }
    }
}

#[test]
fn round1_slots_follow_entrant_positions() {
    let (mut t, ids, stage_id) = tournament_with_participants(8);
    generate_bracket(&mut t, stage_id, &custom_request(&ids), &mut rng()).unwrap();

    let round1: Vec<_> = t.stage_matches(stage_id).filter(|m| m.round_no == 1).collect();
    assert_eq!(round1.len(), 4);
    for (k, m) in round1.iter().enumerate() {
        let a = t
            .slots
            .iter()
            .find(|s| s.target_match_id == m.id && s.target_side == Side::A)
            .unwrap();
        let b = t
            .slots
            .iter()
            .find(|s| s.target_match_id == m.id && s.target_side == Side::B)
            .unwrap();
        assert_eq!(a.source, SlotSource::Seed { seed: 2 * k as u32 + 1 });
        assert_eq!(b.source, SlotSource::Seed { seed: 2 * k as u32 + 2 });
    }
}

#[test]
fn winner_forwarding_slots_point_at_the_round_below() {
    let (mut t, ids, stage_id) = tournament_with_participants(8);
    generate_bracket(&mut t, stage_id, &custom_request(&ids), &mut rng()).unwrap();

    let mut by_round: Vec<Vec<_>> = vec![Vec::new(); 3];
    for m in t.stage_matches(stage_id) {
        by_round[m.round_no as usize - 1].push(m);
    }
    for r in 1..3 {
        for (i, m) in by_round[r].iter().enumerate() {
            for (offset, side) in [(0usize, Side::A), (1, Side::B)] {
                let slot = t
                    .slots
                    .iter()
                    .find(|s| s.target_match_id == m.id && s.target_side == side)
                    .unwrap();
                assert_eq!(
                    slot.source,
                    SlotSource::MatchWinner {
                        match_id: by_round[r - 1][2 * i + offset].id
                    }
                );
            }
        }
    }
}

#[test]
fn generate_fills_round1_immediately() {
    let (mut t, ids, stage_id) = tournament_with_participants(8);
    generate_bracket(&mut t, stage_id, &custom_request(&ids), &mut rng()).unwrap();

    let round1: Vec<_> = t.stage_matches(stage_id).filter(|m| m.round_no == 1).collect();
    for (k, m) in round1.iter().enumerate() {
        assert_eq!(m.side(Side::A).members, vec![ids[2 * k]]);
        assert_eq!(m.side(Side::B).members, vec![ids[2 * k + 1]]);
    }
    for m in t.stage_matches(stage_id).filter(|m| m.round_no > 1) {
        assert!(m.sides.iter().all(|s| s.members.is_empty()));
    }
}

#[test]
fn non_power_of_two_size_fails_before_any_write() {
    let (mut t, ids, stage_id) = tournament_with_participants(4);
    let mut req = custom_request(&ids);
    req.size = Some(6);
    let err = generate_bracket(&mut t, stage_id, &req, &mut rng()).unwrap_err();
    assert_eq!(err, TournamentError::SizeNotPowerOfTwo(6));
    assert!(t.matches.is_empty());
    assert!(t.slots.is_empty());
    assert!(t.participants.iter().all(|p| p.seed.is_none()));
}

#[test]
fn size_smaller_than_entrant_count_fails_before_any_write() {
    let (mut t, ids, stage_id) = tournament_with_participants(6);
    let mut req = custom_request(&ids);
    req.size = Some(4);
    let err = generate_bracket(&mut t, stage_id, &req, &mut rng()).unwrap_err();
    assert_eq!(
        err,
        TournamentError::SizeTooSmall {
            size: 4,
            entrants: 6
        }
    );
    assert!(t.matches.is_empty());
    assert!(t.slots.is_empty());
}

#[test]
fn duplicate_participant_in_custom_pairs_rejected() {
    let (mut t, ids, stage_id) = tournament_with_participants(4);
    let pairs = vec![
        CustomPair {
            side_a: ids[0],
            side_b: ids[1],
        },
        CustomPair {
            side_a: ids[0],
            side_b: ids[2],
        },
    ];
    let req = GenerateBracketRequest::new(EntrantSource::Custom { pairs });
    let err = generate_bracket(&mut t, stage_id, &req, &mut rng()).unwrap_err();
    assert_eq!(err, TournamentError::DuplicateParticipant(ids[0]));
    assert!(t.matches.is_empty());
}

#[test]
fn unknown_participant_in_custom_pairs_rejected() {
    let (mut t, ids, stage_id) = tournament_with_participants(2);
    let ghost = Uuid::new_v4();
    let pairs = vec![CustomPair {
        side_a: ids[0],
        side_b: ghost,
    }];
    let req = GenerateBracketRequest::new(EntrantSource::Custom { pairs });
    let err = generate_bracket(&mut t, stage_id, &req, &mut rng()).unwrap_err();
    assert_eq!(err, TournamentError::ParticipantNotFound(ghost));
}

#[test]
fn a_stage_is_generated_only_once() {
    let (mut t, ids, stage_id) = tournament_with_participants(4);
    generate_bracket(&mut t, stage_id, &custom_request(&ids), &mut rng()).unwrap();
    let err = generate_bracket(&mut t, stage_id, &custom_request(&ids), &mut rng()).unwrap_err();
    assert_eq!(err, TournamentError::StageAlreadyGenerated);
    assert_eq!(t.matches.len(), 3);
}

#[test]
fn bracket_requires_a_knockout_stage() {
    let (mut t, ids, _) = tournament_with_participants(4);
    let group_stage = t.add_stage("Groups", StageKind::Group);
    let err = generate_bracket(&mut t, group_stage, &custom_request(&ids), &mut rng()).unwrap_err();
    assert_eq!(err, TournamentError::NotAKnockoutStage);
}

#[test]
fn ten_entrants_round_up_to_a_sixteen_bracket_with_byes() {
    let (mut t, ids, stage_id) = tournament_with_participants(10);
    generate_bracket(&mut t, stage_id, &custom_request(&ids), &mut rng()).unwrap();

    assert_eq!(t.stage_matches(stage_id).count(), 15);
    assert_eq!(
        t.stage_matches(stage_id)
            .map(|m| m.round_no)
            .max()
            .unwrap(),
        4
    );
    // 16 round-1 sides, 10 entrants: 6 byes, i.e. 6 sides with no slot.
    let round1_slots = t
        .slots
        .iter()
        .filter(|s| matches!(s.source, SlotSource::Seed { .. }))
        .count();
    assert_eq!(round1_slots, 10);
    let empty_round1_sides: usize = t
        .stage_matches(stage_id)
        .filter(|m| m.round_no == 1)
        .map(|m| m.sides.iter().filter(|s| s.members.is_empty()).count())
        .sum();
    assert_eq!(empty_round1_sides, 6);
}

#[test]
fn resolve_is_idempotent() {
    let (mut t, ids, stage_id) = tournament_with_participants(8);
    generate_bracket(&mut t, stage_id, &custom_request(&ids), &mut rng()).unwrap();
    // Generation already resolved round 1; nothing new without results.
    assert_eq!(resolve_bracket(&mut t, stage_id).unwrap(), 0);
    assert_eq!(resolve_bracket(&mut t, stage_id).unwrap(), 0);
}

#[test]
fn winner_is_forwarded_once_and_never_replaced() {
    let (mut t, ids, stage_id) = tournament_with_participants(4);
    generate_bracket(&mut t, stage_id, &custom_request(&ids), &mut rng()).unwrap();

    let first_match = t
        .stage_matches(stage_id)
        .find(|m| m.round_no == 1 && m.match_no == 1)
        .unwrap()
        .id;
    let final_match = t
        .stage_matches(stage_id)
        .find(|m| m.round_no == 2)
        .unwrap()
        .id;

    t.record_match_result(first_match, Side::B).unwrap();
    assert_eq!(resolve_bracket(&mut t, stage_id).unwrap(), 1);
    let forwarded = t.match_by_id(final_match).unwrap().side(Side::A).members.clone();
    assert_eq!(forwarded, vec![ids[1]]);

    // Further calls change nothing.
    assert_eq!(resolve_bracket(&mut t, stage_id).unwrap(), 0);

    // Flipping the upstream result later never rewrites a filled side.
    t.record_match_result(first_match, Side::A).unwrap();
    assert_eq!(resolve_bracket(&mut t, stage_id).unwrap(), 0);
    assert_eq!(
        t.match_by_id(final_match).unwrap().side(Side::A).members,
        forwarded
    );
}

#[test]
fn random_source_persists_seeds_and_is_deterministic_under_a_stubbed_rng() {
    let (mut t, _, _) = tournament_with_participants(6);
    let mut t2 = t.clone();

    let (entrants, size) = resolve_entrants(
        &mut t,
        &EntrantSource::Random,
        None,
        SeedOrder::Normal,
        &mut rng(),
    )
    .unwrap();
    let (entrants2, _) = resolve_entrants(
        &mut t2,
        &EntrantSource::Random,
        None,
        SeedOrder::Normal,
        &mut rng(),
    )
    .unwrap();

    assert_eq!(size, 8);
    assert_eq!(entrants, entrants2);
    let mut seeds: Vec<u32> = t.participants.iter().filter_map(|p| p.seed).collect();
    seeds.sort_unstable();
    assert_eq!(seeds, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn random_source_truncates_to_an_explicit_size() {
    let (mut t, _, _) = tournament_with_participants(10);
    let (entrants, size) = resolve_entrants(
        &mut t,
        &EntrantSource::Random,
        Some(4),
        SeedOrder::Normal,
        &mut rng(),
    )
    .unwrap();
    assert_eq!(size, 4);
    assert_eq!(entrants.len(), 4);
}

#[test]
fn reverse_seed_order_reverses_placement() {
    let (mut t, ids, stage_id) = tournament_with_participants(4);
    let mut req = custom_request(&ids);
    req.seed_order = SeedOrder::Reverse;
    generate_bracket(&mut t, stage_id, &req, &mut rng()).unwrap();

    // Slot "seed 1" of round-1 match 1 now resolves to the last entrant.
    let first = t
        .stage_matches(stage_id)
        .find(|m| m.round_no == 1 && m.match_no == 1)
        .unwrap();
    assert_eq!(first.side(Side::A).members, vec![ids[3]]);
    assert_eq!(first.side(Side::B).members, vec![ids[2]]);
}

#[test]
fn bracket_view_reports_resolution_state_and_names() {
    // 6 entrants round up to size 8: round-1 match 4 is a double bye.
    let (mut t, ids, stage_id) = tournament_with_participants(6);
    generate_bracket(&mut t, stage_id, &custom_request(&ids), &mut rng()).unwrap();

    let view = get_bracket(&t, stage_id).unwrap();
    assert_eq!(view.stage_id, stage_id);
    assert_eq!(view.matches.len(), 7);
    // 6 seed slots plus 4 + 2 winner-forwarding slots; bye sides get none.
    assert_eq!(view.slots.len(), 12);
    assert!(!view
        .slots
        .iter()
        .any(|s| s.round_no == 1 && s.match_no == 4));

    for slot in view.slots.iter().filter(|s| s.round_no == 1) {
        assert!(slot.resolved);
        let expected = match slot.source {
            SlotSource::Seed { seed } => t.participant_by_seed(seed).unwrap().name.clone(),
            _ => panic!("round-1 slot should be seed-sourced"),
        };
        assert_eq!(slot.participant.as_deref(), Some(expected.as_str()));
    }
    for slot in view.slots.iter().filter(|s| s.round_no > 1) {
        assert!(!slot.resolved);
        assert_eq!(slot.participant, None);
    }

    // A recorded result flips exactly the forwarded slot to resolved.
    let first_match = t
        .stage_matches(stage_id)
        .find(|m| m.round_no == 1 && m.match_no == 1)
        .unwrap()
        .id;
    t.record_match_result(first_match, Side::A).unwrap();
    resolve_bracket(&mut t, stage_id).unwrap();

    let view = get_bracket(&t, stage_id).unwrap();
    let forwarded = view
        .slots
        .iter()
        .find(|s| s.round_no == 2 && s.match_no == 1 && s.side == Side::A)
        .unwrap();
    assert!(forwarded.resolved);
    let winner_name = t.participant(ids[0]).unwrap().name.clone();
    assert_eq!(forwarded.participant.as_deref(), Some(winner_name.as_str()));
    let still_pending = view
        .slots
        .iter()
        .find(|s| s.round_no == 2 && s.match_no == 1 && s.side == Side::B)
        .unwrap();
    assert!(!still_pending.resolved);
}

fn group_stage_tournament(
    groups: usize,
    per_group: usize,
) -> (Tournament, StageId, StageId, Vec<Vec<ParticipantId>>) {
    let mut t = Tournament::new("Club Open");
    let group_stage = t.add_stage("Groups", StageKind::Group);
    let knockout = t.add_stage("Knockout", StageKind::Knockout);
    let mut by_group = Vec::new();
    for gi in 0..groups {
        let group_id = t.add_group(group_stage, format!("Group {gi}")).unwrap();
        let mut members = Vec::new();
        for pi in 0..per_group {
            let id = t
                .add_participant(format!("G{gi}P{pi}"), vec![])
                .unwrap();
            members.push(id);
        }
        let rows: Vec<GroupStanding> = members
            .iter()
            .enumerate()
            .map(|(rank, &participant_id)| GroupStanding {
                group_id,
                participant_id,
                rank: Some(rank as u32 + 1),
                match_points: (per_group - rank) as i32 * 3,
            })
            .collect();
        t.set_group_standings(group_id, rows).unwrap();
        by_group.push(members);
    }
    (t, group_stage, knockout, by_group)
}

#[test]
fn group_rank_top_two_of_four_groups_fills_an_eight_bracket() {
    let (mut t, group_stage, knockout, by_group) = group_stage_tournament(4, 3);
    let req = GenerateBracketRequest::new(EntrantSource::GroupRank {
        source_stage_id: group_stage,
        top_n_per_group: 2,
        wildcard_count: 0,
    });
    generate_bracket(&mut t, knockout, &req, &mut rng()).unwrap();

    assert_eq!(t.stage_matches(knockout).count(), 7);
    assert_eq!(
        t.stage_matches(knockout).map(|m| m.round_no).max().unwrap(),
        3
    );
    // Standings exist, so every round-1 side resolves at generation time.
    let round1_filled: Vec<ParticipantId> = t
        .stage_matches(knockout)
        .filter(|m| m.round_no == 1)
        .flat_map(|m| m.sides.iter().flat_map(|s| s.members.clone()))
        .collect();
    let expected: Vec<ParticipantId> = by_group
        .iter()
        .flat_map(|g| g.iter().take(2).copied())
        .collect();
    assert_eq!(round1_filled, expected);
}

#[test]
fn group_rank_wildcards_come_from_the_remaining_ranked_pool() {
    let (mut t, group_stage, _, by_group) = group_stage_tournament(2, 3);
    let (entrants, size) = resolve_entrants(
        &mut t,
        &EntrantSource::GroupRank {
            source_stage_id: group_stage,
            top_n_per_group: 1,
            wildcard_count: 2,
        },
        None,
        SeedOrder::Normal,
        &mut rng(),
    )
    .unwrap();

    assert_eq!(size, 4);
    let ids: Vec<ParticipantId> = entrants.iter().map(|e| e.participant_id).collect();
    // Winners first, then the two rank-2 finishers as wildcards.
    assert_eq!(ids[0], by_group[0][0]);
    assert_eq!(ids[1], by_group[1][0]);
    assert!(ids[2..].contains(&by_group[0][1]));
    assert!(ids[2..].contains(&by_group[1][1]));
}

#[test]
fn group_rank_requires_finalized_standings() {
    let mut t = Tournament::new("Club Open");
    let group_stage = t.add_stage("Groups", StageKind::Group);
    let knockout = t.add_stage("Knockout", StageKind::Knockout);
    let group_id = t.add_group(group_stage, "Group A").unwrap();
    let p = t.add_participant("P0", vec![]).unwrap();
    // Standings present but not yet ranked.
    t.set_group_standings(
        group_id,
        vec![GroupStanding {
            group_id,
            participant_id: p,
            rank: None,
            match_points: 0,
        }],
    )
    .unwrap();

    let req = GenerateBracketRequest::new(EntrantSource::GroupRank {
        source_stage_id: group_stage,
        top_n_per_group: 1,
        wildcard_count: 0,
    });
    let err = generate_bracket(&mut t, knockout, &req, &mut rng()).unwrap_err();
    assert!(matches!(err, TournamentError::StandingsIncomplete { .. }));
    assert!(t.matches.is_empty());
}
