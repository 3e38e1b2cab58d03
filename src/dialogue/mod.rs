//! The conversation state machine.
//!
//! [`State`] and its transition table live in `state`, the nested field
//! store in `fields`, per-field parsing in `validators`. The
//! [`DialogueController`] ties them together for one user.

mod controller;
mod fields;
mod flow;
mod state;
mod validators;

pub use controller::{
    DialogueController, DialogueError, GenerationRequest, Transition, edit_group_names,
};
pub use fields::{DEFAULT_SECTIONS, FieldError, FieldMap};
pub use flow::Step;
pub use state::{FORCE_STATES, State, is_valid_transition, prompt_for_state};
pub use validators::{
    InputError, derive_symbol, format_name, is_hex_color, is_skip, normalize_domain,
    normalize_percentage, normalize_url, parse_colors, parse_custom_social, parse_distribution,
    parse_roadmap, parse_sections, parse_tax, validate_supply,
};
