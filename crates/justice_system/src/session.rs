//! Session-side collaborators.
//!
//! The justice system does not own players or chat. The hosting session
//! implements these traits to hand over its roster and deliver notices.

use crate::types::{Identity, Notice};

/// A player connected to a session
pub trait SessionPlayer {
    /// Name shown in chat and used to resolve complaints
    fn display_name(&self) -> &str;

    /// Stable identity the ledger and ban list are keyed by
    fn identity(&self) -> Identity;

    /// Remove the player from the session and refuse them from now on
    fn exclude(&self);
}

/// A running game session as seen by the justice system
pub trait Session {
    type Player: SessionPlayer;

    /// Connected players, in the session's own order
    fn players(&self) -> Vec<Self::Player>;

    /// Send a notice to one player only
    fn reply(&self, target: &Self::Player, notice: Notice);

    /// Send a notice to everybody in the session
    fn broadcast(&self, notice: Notice);
}
