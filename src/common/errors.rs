use thiserror::Error;

use crate::common::types::ChannelId;

/// Broad classification of a handler failure, used by the command layer to
/// decide how to surface it (ephemeral notice vs. disabled control).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request; nothing was mutated.
    Validation,
    /// The session no longer exists (or never did).
    NotFound,
    /// Legal request that lost a race or repeats an action; informational.
    Conflict,
    /// An external channel/message operation failed.
    External,
}

#[derive(Debug, Error)]
pub enum LfgError {
    #[error("unsupported game selected")]
    UnknownGame(String),

    #[error("invalid mode `{mode}` for {game}. Available modes: {available}")]
    InvalidMode {
        game: String,
        mode: String,
        available: String,
    },

    #[error("player count must be between {min} and {max}")]
    CapacityOutOfRange { min: u8, max: u8 },

    #[error("LFG commands can only be used in the designated channel")]
    WrongChannel { expected: ChannelId },

    #[error("you already have an active LFG session")]
    AlreadyOwnsSession,

    #[error("you are already in another LFG session; leave it first")]
    AlreadyInAnotherSession,

    #[error("this LFG session is no longer active")]
    SessionNotFound,

    #[error("this LFG is full")]
    SessionFull,

    #[error("you are not part of this LFG")]
    NotInSession,

    #[error("this session is not in its confirmation phase")]
    WrongPhase,

    #[error("as the session creator you cannot leave; end the session instead")]
    CreatorCannotLeave,

    #[error("you don't have an active LFG session to end")]
    NoOwnedSession,

    #[error("channel provisioning failed: {0}")]
    Provisioning(String),
}

impl LfgError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownGame(_)
            | Self::InvalidMode { .. }
            | Self::CapacityOutOfRange { .. }
            | Self::WrongChannel { .. }
            | Self::AlreadyOwnsSession
            | Self::AlreadyInAnotherSession => ErrorKind::Validation,
            Self::SessionNotFound => ErrorKind::NotFound,
            Self::SessionFull
            | Self::NotInSession
            | Self::WrongPhase
            | Self::CreatorCannotLeave
            | Self::NoOwnedSession => ErrorKind::Conflict,
            Self::Provisioning(_) => ErrorKind::External,
        }
    }
}
