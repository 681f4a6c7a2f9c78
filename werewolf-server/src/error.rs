//! src/error.rs
use crate::types::{Phase, PlayerId, RoomId};

/// Broad class of an engine failure. None of these abort a room: the
/// command is rejected and the state machine carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    InvalidAction,
    TerminalState,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown role {0:?}")]
    UnknownRole(String),
    #[error("configured {configured} roles for {roster} players")]
    RoleCountMismatch { configured: usize, roster: usize },
    #[error("need at least {needed} players, have {have}")]
    NotEnoughPlayers { needed: usize, have: usize },
    #[error("roster contains duplicate player {0}")]
    DuplicatePlayer(PlayerId),

    #[error("no player {0} in this game")]
    UnknownPlayer(PlayerId),
    #[error("player {0} is dead")]
    DeadPlayer(PlayerId),
    #[error("not allowed during {actual}")]
    WrongPhase { actual: Phase },
    #[error("{role} cannot {action}")]
    Ineligible { role: &'static str, action: &'static str },
    #[error("action already submitted for this night")]
    LateAction,
    #[error("ballot already cast")]
    AlreadyVoted,
    #[error("player {0} has no voting rights")]
    NoVotingRights(PlayerId),
    #[error("duel already used")]
    DuelUsed,
    #[error("invalid target: {0}")]
    InvalidTarget(&'static str),
    #[error("not your turn to speak")]
    NotSpeaker,

    #[error("game is over")]
    TerminalState,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::UnknownRole(_)
            | EngineError::RoleCountMismatch { .. }
            | EngineError::NotEnoughPlayers { .. }
            | EngineError::DuplicatePlayer(_) => ErrorKind::Config,
            EngineError::TerminalState => ErrorKind::TerminalState,
            _ => ErrorKind::InvalidAction,
        }
    }
}

/// Failures of the room layer around the engine: lobby bookkeeping, plus
/// any engine rejection passed through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("no room {0}")]
    NoSuchRoom(RoomId),
    #[error("room is full ({0} players)")]
    RoomFull(usize),
    #[error("no free room code left")]
    NoFreeRoomCode,
    #[error("game already started")]
    AlreadyStarted,
    #[error("only the host can start the game")]
    NotHost,
    #[error("join or create a room first")]
    NotInRoom,
    #[error("already in room {0}")]
    AlreadyInRoom(RoomId),
    #[error("you cannot speak right now")]
    Muted,
    #[error(transparent)]
    Engine(#[from] EngineError),
}
