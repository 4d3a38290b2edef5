//! Club tournament bracket engine: library with models and business logic.

pub mod logic;
pub mod models;

pub use logic::{
    apply_draw, assign_slots, build_tree, create_draw, generate_bracket, get_bracket,
    resolve_bracket, resolve_entrants, update_draw, BracketView, Entrant, EntrantOrigin,
};
pub use models::{
    BracketMatch, BracketSlot, CustomPair, DrawId, DrawOutcome, DrawPayload, DrawSession,
    DrawStatus, EntrantSource, GenerateBracketRequest, GroupId, GroupStanding, MatchId,
    MatchStatus, ParticipantId, ProposedAssignment, ProposedPair, SeedOrder, Side, SlotSource,
    StageId, StageKind, Tournament, TournamentError, TournamentId, UserId,
};
