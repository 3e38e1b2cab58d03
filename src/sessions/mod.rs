//! Per-user sessions and their expiry.

mod registry;
mod sweeper;

pub use registry::{Session, SessionRegistry};
pub use sweeper::{SessionSweeper, SweeperMessage};

/// Identifies a chat user.
pub type UserId = i64;
