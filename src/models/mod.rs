//! Data structures for the bracket engine: tournament aggregate, bracket
//! matches and slots, and draw sessions.

mod bracket;
mod draw;
mod tournament;

pub use bracket::{
    BracketMatch, BracketSlot, CustomPair, EntrantSource, GenerateBracketRequest, MatchId,
    MatchSide, MatchStatus, SeedOrder, Side, SlotSource,
};
pub use draw::{
    DrawGroupAssignment, DrawId, DrawOutcome, DrawPairing, DrawPayload, DrawSession, DrawStatus,
    ProposedAssignment, ProposedPair,
};
pub use tournament::{
    Group, GroupId, GroupStanding, ParticipantId, Stage, StageId, StageKind, Tournament,
    TournamentError, TournamentId, TournamentParticipant, User, UserId,
};
