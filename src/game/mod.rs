//! Game simulation modules

pub mod combat;
pub mod items;
pub mod r#match;
pub mod obstacles;
pub mod physics;
pub mod player;
pub mod snapshot;
pub mod standings;
pub mod zone;

pub use r#match::{GameMatch, MatchHandle, MatchState};

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Event from a session, applied at the start of the next tick
#[derive(Debug)]
pub struct SessionEvent {
    pub session_id: Uuid,
    pub kind: SessionEventKind,
    /// Unix millis when the server received it
    pub received_at: u64,
}

#[derive(Debug)]
pub enum SessionEventKind {
    /// New connection; the welcome message is delivered on `reply`
    Join { reply: oneshot::Sender<ServerMsg> },
    Message(ClientMsg),
    Disconnect,
}

/// Why a session action was dropped. Never reported to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionRejected {
    #[error("player is dead")]
    Dead,

    #[error("match is not in progress")]
    WrongPhase,

    #[error("weapon is cooling down")]
    Cooldown,

    #[error("not enough ammo")]
    OutOfAmmo,

    #[error("no medkits carried")]
    NoMedkits,

    #[error("item cannot be used")]
    NotUsable,

    #[error("name is empty after sanitizing")]
    EmptyName,

    #[error("unknown session")]
    UnknownSession,
}
