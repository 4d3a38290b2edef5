//! Tournament aggregate: users, participants, stages, groups, bracket state,
//! and draw sessions, plus the crate-wide error type.

use crate::models::bracket::{BracketMatch, BracketSlot, MatchId, MatchStatus, Side};
use crate::models::draw::{DrawGroupAssignment, DrawId, DrawPairing, DrawSession};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;
/// Unique identifier for a club member (individual person).
pub type UserId = Uuid;
/// Unique identifier for a tournament entry (individual or doubles team).
pub type ParticipantId = Uuid;
/// Unique identifier for a tournament stage.
pub type StageId = Uuid;
/// Unique identifier for a round-robin group.
pub type GroupId = Uuid;

/// Errors that can occur during bracket and draw operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Stage does not exist in this tournament.
    StageNotFound(StageId),
    /// Match does not exist in this tournament.
    MatchNotFound(MatchId),
    /// Draw session does not exist in this tournament.
    DrawNotFound(DrawId),
    /// Participant does not exist in this tournament.
    ParticipantNotFound(ParticipantId),
    /// User does not exist in this tournament.
    UserNotFound(UserId),
    /// Group does not exist in this tournament.
    GroupNotFound(GroupId),
    /// Bracket operations require a knockout stage.
    NotAKnockoutStage,
    /// Groups can only be created on a group stage.
    NotAGroupStage,
    /// The stage already has matches; brackets are generated once.
    StageAlreadyGenerated,
    /// Bracket size must be a power of two.
    SizeNotPowerOfTwo(u32),
    /// Bracket size must fit all entrants.
    SizeTooSmall { size: u32, entrants: usize },
    /// The entrant source produced no entrants.
    NoEntrants,
    /// The tournament has no participants to draw from.
    NoParticipants,
    /// A participant appears more than once in the supplied set.
    DuplicateParticipant(ParticipantId),
    /// A user appears more than once in the proposed pairs.
    DuplicateUser(UserId),
    /// A user with this name already exists (names are unique, case-insensitive).
    DuplicateUserName,
    /// The source stage has no groups to rank entrants from.
    NoGroupsInStage(StageId),
    /// A group has fewer ranked standings than the requested top-N.
    StandingsIncomplete {
        group_id: GroupId,
        ranked: usize,
        needed: usize,
    },
    /// The participant is already assigned to a group in this tournament.
    ParticipantAlreadyGrouped(ParticipantId),
    /// The draw session was already applied; it is immutable history.
    DrawAlreadyApplied,
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::StageNotFound(id) => write!(f, "Stage {} not found", id),
            TournamentError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            TournamentError::DrawNotFound(id) => write!(f, "Draw session {} not found", id),
            TournamentError::ParticipantNotFound(id) => write!(f, "Participant {} not found", id),
            TournamentError::UserNotFound(id) => write!(f, "User {} not found", id),
            TournamentError::GroupNotFound(id) => write!(f, "Group {} not found", id),
            TournamentError::NotAKnockoutStage => write!(f, "Stage is not a knockout stage"),
            TournamentError::NotAGroupStage => write!(f, "Stage is not a group stage"),
            TournamentError::StageAlreadyGenerated => {
                write!(f, "Stage already has matches; a bracket is generated only once")
            }
            TournamentError::SizeNotPowerOfTwo(size) => {
                write!(f, "Bracket size {} is not a power of two", size)
            }
            TournamentError::SizeTooSmall { size, entrants } => {
                write!(f, "Bracket size {} cannot fit {} entrants", size, entrants)
            }
            TournamentError::NoEntrants => write!(f, "No entrants supplied"),
            TournamentError::NoParticipants => write!(f, "Tournament has no participants"),
            TournamentError::DuplicateParticipant(id) => {
                write!(f, "Participant {} appears more than once", id)
            }
            TournamentError::DuplicateUser(id) => write!(f, "User {} appears more than once", id),
            TournamentError::DuplicateUserName => {
                write!(f, "A user with this name already exists")
            }
            TournamentError::NoGroupsInStage(id) => write!(f, "Stage {} has no groups", id),
            TournamentError::StandingsIncomplete {
                group_id,
                ranked,
                needed,
            } => write!(
                f,
                "Group {} has only {} ranked standings (need {})",
                group_id, ranked, needed
            ),
            TournamentError::ParticipantAlreadyGrouped(id) => {
                write!(f, "Participant {} is already assigned to a group", id)
            }
            TournamentError::DrawAlreadyApplied => {
                write!(f, "Draw session was already applied")
            }
        }
    }
}

/// Kind of a tournament stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Round-robin groups; standings are computed elsewhere and consumed here.
    Group,
    /// Single-elimination bracket.
    Knockout,
}

/// One phase of a tournament (group stage, knockout stage, ...).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    pub kind: StageKind,
}

/// A club member who can be paired into teams.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

/// A tournament entry: an individual or a doubles team.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentParticipant {
    pub id: ParticipantId,
    pub name: String,
    /// Placement-order number, assigned by entrant resolution. Unique per
    /// tournament while set.
    pub seed: Option<u32>,
    /// Users behind this entry (two for a doubles team, usually one otherwise).
    pub user_ids: Vec<UserId>,
}

/// A round-robin group within a group stage.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub stage_id: StageId,
    pub name: String,
    pub members: Vec<ParticipantId>,
}

/// Ranked result row of a group, produced by the round-robin collaborator.
/// `rank` stays None until standings are finalized.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GroupStanding {
    pub group_id: GroupId,
    pub participant_id: ParticipantId,
    pub rank: Option<u32>,
    pub match_points: i32,
}

/// Full tournament state: the aggregate every engine operation works on.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub users: Vec<User>,
    pub participants: Vec<TournamentParticipant>,
    pub stages: Vec<Stage>,
    pub groups: Vec<Group>,
    /// Group standings, consumed read-only by the bracket engine.
    pub standings: Vec<GroupStanding>,
    /// All bracket matches across stages, in creation order (round-major
    /// within a stage; this order is load-bearing for winner forwarding).
    pub matches: Vec<BracketMatch>,
    /// Slot declarations for all bracket matches.
    pub slots: Vec<BracketSlot>,
    pub draws: Vec<DrawSession>,
    /// Audit: doubles teams created by applied draws.
    pub pairings: Vec<DrawPairing>,
    /// Audit: group placements performed by applied draws.
    pub group_assignments: Vec<DrawGroupAssignment>,
}

impl Tournament {
    /// Create an empty tournament.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            users: Vec::new(),
            participants: Vec::new(),
            stages: Vec::new(),
            groups: Vec::new(),
            standings: Vec::new(),
            matches: Vec::new(),
            slots: Vec::new(),
            draws: Vec::new(),
            pairings: Vec::new(),
            group_assignments: Vec::new(),
        }
    }

    /// Register a club member. Names must be unique (case-insensitive).
    pub fn add_user(&mut self, name: impl Into<String>) -> Result<UserId, TournamentError> {
        let name = name.into();
        let trimmed = name.trim();
        let is_duplicate = self
            .users
            .iter()
            .any(|u| u.name.eq_ignore_ascii_case(trimmed));
        if is_duplicate {
            return Err(TournamentError::DuplicateUserName);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: trimmed.to_string(),
        };
        let id = user.id;
        self.users.push(user);
        Ok(id)
    }

    /// Enter a participant. All referenced users must exist.
    pub fn add_participant(
        &mut self,
        name: impl Into<String>,
        user_ids: Vec<UserId>,
    ) -> Result<ParticipantId, TournamentError> {
        for &uid in &user_ids {
            if self.user(uid).is_none() {
                return Err(TournamentError::UserNotFound(uid));
            }
        }
        let participant = TournamentParticipant {
            id: Uuid::new_v4(),
            name: name.into(),
            seed: None,
            user_ids,
        };
        let id = participant.id;
        self.participants.push(participant);
        Ok(id)
    }

    /// Add a stage (group or knockout).
    pub fn add_stage(&mut self, name: impl Into<String>, kind: StageKind) -> StageId {
        let stage = Stage {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
        };
        let id = stage.id;
        self.stages.push(stage);
        id
    }

    /// Add a round-robin group to a group stage.
    pub fn add_group(
        &mut self,
        stage_id: StageId,
        name: impl Into<String>,
    ) -> Result<GroupId, TournamentError> {
        let stage = self
            .stage(stage_id)
            .ok_or(TournamentError::StageNotFound(stage_id))?;
        if stage.kind != StageKind::Group {
            return Err(TournamentError::NotAGroupStage);
        }
        let group = Group {
            id: Uuid::new_v4(),
            stage_id,
            name: name.into(),
            members: Vec::new(),
        };
        let id = group.id;
        self.groups.push(group);
        Ok(id)
    }

    /// Replace the standings of a group (collaborator seam: standings are
    /// computed by the round-robin subsystem and written here).
    pub fn set_group_standings(
        &mut self,
        group_id: GroupId,
        rows: Vec<GroupStanding>,
    ) -> Result<(), TournamentError> {
        if self.group(group_id).is_none() {
            return Err(TournamentError::GroupNotFound(group_id));
        }
        for row in &rows {
            if self.participant(row.participant_id).is_none() {
                return Err(TournamentError::ParticipantNotFound(row.participant_id));
            }
        }
        self.standings.retain(|s| s.group_id != group_id);
        self.standings
            .extend(rows.into_iter().map(|mut r| {
                r.group_id = group_id;
                r
            }));
        Ok(())
    }

    /// Record the outcome of a match (collaborator seam: win/loss is decided
    /// by score entry, consumed here as a "side is winner" flag). Marks the
    /// match Completed. Does not touch downstream slots; callers re-run
    /// resolution afterwards.
    pub fn record_match_result(
        &mut self,
        match_id: MatchId,
        winner: Side,
    ) -> Result<(), TournamentError> {
        let m = self
            .match_mut(match_id)
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        for side in &mut m.sides {
            side.is_winner = side.side == winner;
        }
        m.status = MatchStatus::Completed;
        Ok(())
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&TournamentParticipant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Participant currently holding the given seed number.
    pub fn participant_by_seed(&self, seed: u32) -> Option<&TournamentParticipant> {
        self.participants.iter().find(|p| p.seed == Some(seed))
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn match_by_id(&self, id: MatchId) -> Option<&BracketMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn match_mut(&mut self, id: MatchId) -> Option<&mut BracketMatch> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// Matches of one stage, in creation order.
    pub fn stage_matches(&self, stage_id: StageId) -> impl Iterator<Item = &BracketMatch> {
        self.matches.iter().filter(move |m| m.stage_id == stage_id)
    }

    pub fn draw(&self, id: DrawId) -> Option<&DrawSession> {
        self.draws.iter().find(|d| d.id == id)
    }

    pub fn draw_mut(&mut self, id: DrawId) -> Option<&mut DrawSession> {
        self.draws.iter_mut().find(|d| d.id == id)
    }

    /// Whether the participant is already in any group of this tournament.
    pub fn is_grouped(&self, participant_id: ParticipantId) -> bool {
        self.groups
            .iter()
            .any(|g| g.members.contains(&participant_id))
    }
}
