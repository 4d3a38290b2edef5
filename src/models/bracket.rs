//! Bracket structure: matches, sides, slot declarations, and generation requests.

use crate::models::tournament::{GroupId, ParticipantId, StageId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a bracket match.
pub type MatchId = Uuid;

/// One of the two competing slots of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

/// Lifecycle of a match. Scoring lives outside the engine; it only flips
/// status to Completed when a winner side is recorded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Completed,
}

/// One competing slot of a match. Members are participant ids; a doubles
/// team forwards as a single participant, so this usually holds 0 or 1 ids.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchSide {
    pub side: Side,
    /// Participant ids occupying this side. Empty until resolved; once
    /// non-empty it is never cleared or replaced.
    pub members: Vec<ParticipantId>,
    pub is_winner: bool,
}

impl MatchSide {
    fn new(side: Side) -> Self {
        Self {
            side,
            members: Vec::new(),
            is_winner: false,
        }
    }
}

/// A single bracket fixture. `round_no` is 1-based from the first round;
/// `match_no` is 1-based within the round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: MatchId,
    pub stage_id: StageId,
    pub round_no: u32,
    pub match_no: u32,
    pub best_of: u32,
    pub status: MatchStatus,
    /// Exactly two sides (A, B), created together with the match.
    pub sides: [MatchSide; 2],
}

impl BracketMatch {
    pub fn new(stage_id: StageId, round_no: u32, match_no: u32, best_of: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage_id,
            round_no,
            match_no,
            best_of,
            status: MatchStatus::Scheduled,
            sides: [MatchSide::new(Side::A), MatchSide::new(Side::B)],
        }
    }

    pub fn side(&self, side: Side) -> &MatchSide {
        match side {
            Side::A => &self.sides[0],
            Side::B => &self.sides[1],
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut MatchSide {
        match side {
            Side::A => &mut self.sides[0],
            Side::B => &mut self.sides[1],
        }
    }

    /// The winning side, if exactly one side has been marked as winner.
    pub fn winner_side(&self) -> Option<&MatchSide> {
        let mut winners = self.sides.iter().filter(|s| s.is_winner);
        match (winners.next(), winners.next()) {
            (Some(w), None) => Some(w),
            _ => None,
        }
    }
}

/// How a match side will eventually be populated. The variant carries only
/// the fields that make sense for it, so a slot can never hold a source
/// field that contradicts its kind.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "snake_case")]
pub enum SlotSource {
    /// Fixed placement: the participant whose persisted seed equals `seed`.
    Seed { seed: u32 },
    /// Ranked outcome of a round-robin group.
    GroupRank { group_id: GroupId, rank: u32 },
    /// Winner of an earlier match in the same bracket.
    MatchWinner { match_id: MatchId },
}

/// Declaration of how one match side gets filled. Exactly one slot exists
/// per (match, side) that is fillable; sides left without a slot are byes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketSlot {
    pub target_match_id: MatchId,
    pub target_side: Side,
    pub source: SlotSource,
}

/// Where the entrant list for a bracket comes from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "snake_case")]
pub enum EntrantSource {
    /// Caller-supplied pairs, in bracket order.
    Custom { pairs: Vec<CustomPair> },
    /// All tournament participants, shuffled.
    Random,
    /// Top finishers of a prior group stage, optionally plus wildcards.
    GroupRank {
        source_stage_id: StageId,
        top_n_per_group: u32,
        #[serde(default)]
        wildcard_count: u32,
    },
}

/// One explicitly supplied round-1 pairing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CustomPair {
    pub side_a: ParticipantId,
    pub side_b: ParticipantId,
}

/// Direction of seed numbering when persisting seeds for CUSTOM/RANDOM.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOrder {
    #[default]
    Normal,
    Reverse,
}

fn default_best_of() -> u32 {
    1
}

/// Parameters for generating a knockout bracket on a stage.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GenerateBracketRequest {
    #[serde(flatten)]
    pub source: EntrantSource,
    /// Bracket size; when absent, the smallest power of two that fits the
    /// entrant list is used.
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub seed_order: SeedOrder,
    #[serde(default = "default_best_of")]
    pub best_of: u32,
}

impl GenerateBracketRequest {
    pub fn new(source: EntrantSource) -> Self {
        Self {
            source,
            size: None,
            seed_order: SeedOrder::Normal,
            best_of: default_best_of(),
        }
    }
}
