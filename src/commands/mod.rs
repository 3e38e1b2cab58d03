//! Command handling module.
//!
//! Routes chat messages to commands (prefix `/` by default) or to the
//! dialogue of the sending user.

mod handler;
mod types;

pub use handler::ConversationHandler;
pub use types::{ChatCommand, Reply};
