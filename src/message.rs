//! The message envelope exchanged between airplanes and traffic controllers.
//!
//! Every message carries an explicit sender and receiver identity; receivers
//! resolve an identity back to its descriptor through the communicator's
//! registry, never by inspecting the message for a concrete type.
//!
//! Controller-bound kinds have a fixed priority and controller inboxes act on
//! higher priorities first (see [`crate::inbox`]). Airplane-bound kinds are
//! all priority 0 and delivered FIFO.

use crate::error::{AtcError, Result};
use crate::runway::Runway;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Canned message texts, kept human-readable because the runway index is
/// carried inside the text and parsed back out on receipt.
pub const PLEASE_CIRCLE_AROUND_THE_AIRPORT: &str = "Please circle around the airport.";
pub const READY_TO_LAND: &str = "Ready to land.";
pub const MAYDAY: &str = "Mayday.";

pub fn land_on_runway_text(runway: Runway) -> String {
    format!("Please land on a runway {}", runway.index())
}

pub fn landed_on_runway_text(runway: Runway) -> String {
    format!("Landed on runway {}.", runway.index())
}

/// Message kinds with their inbox priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    // Kinds delivered to traffic controllers:
    LandingApproved,
    EmergencyCallToLand,
    ReadyToLand,
    Terminated,
    Synchronisation,
    // Kinds delivered to airplanes:
    WaitingAround,
    LandOnARunway,
}

impl MessageKind {
    /// Inbox priority; a higher value is acted on first.
    pub fn priority(self) -> u8 {
        match self {
            MessageKind::LandingApproved => 4,
            MessageKind::EmergencyCallToLand => 3,
            MessageKind::ReadyToLand => 2,
            MessageKind::Terminated => 1,
            MessageKind::Synchronisation => 0,
            MessageKind::WaitingAround | MessageKind::LandOnARunway => 0,
        }
    }
}

/// Identity of a message endpoint, resolved through the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Participant {
    Airplane(String),
    Controller(usize),
    /// The message router itself, sender of the termination broadcast.
    Dispatcher,
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Participant::Airplane(name) => write!(f, "{name}"),
            Participant::Controller(id) => write!(f, "Traffic controller {id}"),
            Participant::Dispatcher => write!(f, "Dispatcher"),
        }
    }
}

/// Immutable message envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
    pub sender: Participant,
    pub receiver: Participant,
}

impl Message {
    pub fn new(
        kind: MessageKind,
        text: impl Into<String>,
        sender: Participant,
        receiver: Participant,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            sender,
            receiver,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} -> {}: {}]", self.sender, self.receiver, self.text)
    }
}

fn runway_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Matches the trailing runway index, e.g. "Please land on a runway 1".
    PATTERN.get_or_init(|| Regex::new(r"(?P<index>\d+)\s*\.?\s*$").expect("runway pattern is valid"))
}

/// Extracts the runway index from a message text.
///
/// Used for `LandOnARunway` and `LandingApproved` texts; an unparsable text
/// is fatal to the receiving task.
pub fn runway_from_text(text: &str) -> Result<Runway> {
    runway_pattern()
        .captures(text)
        .and_then(|captures| captures["index"].parse::<usize>().ok())
        .and_then(Runway::from_index)
        .ok_or_else(|| AtcError::MalformedMessage {
            text: text.to_string(),
        })
}
