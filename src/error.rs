use crate::runway::Runway;
use thiserror::Error;

/// Errors raised by the coordination core.
///
/// A `RunwayCollision` or `MalformedMessage` is fatal to the task that hits
/// it: both signal a protocol violation, not a recoverable condition.
#[derive(Error, Debug)]
pub enum AtcError {
    #[error("runway {runway} is occupied by '{occupant}' while '{airplane}' tried to land")]
    RunwayCollision {
        runway: Runway,
        occupant: String,
        airplane: String,
    },

    #[error("no runway index could be parsed from message text: '{text}'")]
    MalformedMessage { text: String },

    #[error("airplane '{0}' is not registered for communication")]
    UnknownAirplane(String),

    #[error("traffic controller {0} is not registered for communication")]
    UnknownController(usize),

    #[error("mailbox closed: receiver for '{0}' is gone")]
    MailboxClosed(String),
}

pub type Result<T> = std::result::Result<T, AtcError>;
