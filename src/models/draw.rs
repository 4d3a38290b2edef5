//! Draw sessions: staged entrant arrangements, applied exactly once.

use crate::models::bracket::GenerateBracketRequest;
use crate::models::tournament::{GroupId, ParticipantId, StageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a draw session.
pub type DrawId = Uuid;

/// Lifecycle of a draw session: Draft while it is being staged, Applied
/// once its arrangement has been committed. There is no way back.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawStatus {
    #[default]
    Draft,
    Applied,
}

/// A proposed doubles team: two users to be paired into one participant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProposedPair {
    pub user_a: UserId,
    pub user_b: UserId,
}

/// A proposed placement of a participant into a group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProposedAssignment {
    pub group_id: GroupId,
    pub participant_id: ParticipantId,
}

/// What a draw session proposes to do, one shape per draw type.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawPayload {
    /// Pair users into doubles teams, in seed order.
    DoublesPairing { pairs: Vec<ProposedPair> },
    /// Place participants into round-robin groups.
    GroupAssignment { assignments: Vec<ProposedAssignment> },
    /// Generate a knockout bracket on a stage.
    KnockoutPairing {
        stage_id: StageId,
        request: GenerateBracketRequest,
    },
}

impl DrawPayload {
    /// Stage this payload operates on, if it names one.
    pub fn stage_id(&self) -> Option<StageId> {
        match self {
            DrawPayload::KnockoutPairing { stage_id, .. } => Some(*stage_id),
            _ => None,
        }
    }
}

/// The computed arrangement a draw produced (or stages interactively while
/// still Draft).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawOutcome {
    Pairings { pairs: Vec<ProposedPair> },
    Assignments { assignments: Vec<ProposedAssignment> },
    EntrantOrder { participant_ids: Vec<ParticipantId> },
}

/// A staged, revisable proposal for an entrant arrangement. Payload and
/// result are mutable only while Draft; applying freezes the session.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DrawSession {
    pub id: DrawId,
    /// Stage the draw targets, when the payload names one (knockout draws).
    pub stage_id: Option<StageId>,
    pub status: DrawStatus,
    pub payload: DrawPayload,
    pub result: Option<DrawOutcome>,
    pub created_at: DateTime<Utc>,
    pub applied_at: Option<DateTime<Utc>>,
}

impl DrawSession {
    pub fn new(payload: DrawPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage_id: payload.stage_id(),
            status: DrawStatus::Draft,
            payload,
            result: None,
            created_at: Utc::now(),
            applied_at: None,
        }
    }
}

/// Audit row: one doubles team a draw actually created.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DrawPairing {
    pub draw_id: DrawId,
    pub side_a: UserId,
    pub side_b: UserId,
    /// The team participant created from the pair.
    pub participant_id: ParticipantId,
}

/// Audit row: one group placement a draw actually performed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DrawGroupAssignment {
    pub draw_id: DrawId,
    pub group_id: GroupId,
    pub participant_id: ParticipantId,
}
