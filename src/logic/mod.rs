//! Bracket engine and draw orchestration: entrant resolution, tree building,
//! slot assignment, resolution, and draw sessions.

mod draw;
mod entrants;
mod generate;
mod resolve;
mod slots;
mod tree;

pub use draw::{apply_draw, create_draw, update_draw};
pub use entrants::{resolve_entrants, Entrant, EntrantOrigin};
pub use generate::{
    generate_bracket, get_bracket, BracketView, MatchView, MemberView, SideView, SlotView,
};
pub use resolve::resolve_bracket;
pub use slots::assign_slots;
pub use tree::build_tree;
