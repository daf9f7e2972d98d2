//! Landing proposals and the two-party synchronization primitives.
//!
//! Each decision round a controller builds a [`Proposal`] from its local
//! runway view and intake queues, exchanges it with its peer through the
//! peer's [`ProposalSlot`], and merges the two maps so that every runway has
//! at most one winner across both controllers.
//!
//! A runway a controller already handed out is represented by
//! [`RunwayClaim::InProgress`]: it takes part in the exchange (it blocks the
//! peer from assigning that runway) but is never comparable and never
//! executed.

use crate::config::AirplaneSize;
use crate::request::{LandingRequest, LandingRequestStorage};
use crate::runway::{Runway, RUNWAY_COUNT};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::Notify;

/// One entry of a proposal: either a real candidate for the runway, or a
/// marker that the runway is currently occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunwayClaim {
    Candidate(LandingRequest),
    InProgress,
}

impl RunwayClaim {
    pub fn candidate(&self) -> Option<&LandingRequest> {
        match self {
            RunwayClaim::Candidate(request) => Some(request),
            RunwayClaim::InProgress => None,
        }
    }
}

/// A controller's proposed runway assignments for one decision round.
///
/// At most one claim per runway; a runway absent from the map means no
/// decision is pending for it this round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proposal {
    entries: HashMap<Runway, RunwayClaim>,
}

impl Proposal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, runway: Runway, claim: RunwayClaim) {
        self.entries.insert(runway, claim);
    }

    pub fn get(&self, runway: Runway) -> Option<&RunwayClaim> {
        self.entries.get(&runway)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Runway, &RunwayClaim)> {
        self.entries.iter().map(|(runway, claim)| (*runway, claim))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `airplane` is among the executable candidates.
    pub fn contains_airplane(&self, airplane: &str) -> bool {
        self.entries
            .values()
            .filter_map(RunwayClaim::candidate)
            .any(|request| request.airplane == airplane)
    }
}

/// The more preferable of two claims for the same runway, or `None` when
/// either side marks the runway in progress: an occupied runway is never
/// assigned by comparison.
pub fn select_more_preferable<'a>(
    a: &'a RunwayClaim,
    b: &'a RunwayClaim,
) -> Option<&'a LandingRequest> {
    match (a, b) {
        (RunwayClaim::Candidate(ours), RunwayClaim::Candidate(theirs)) => {
            Some(LandingRequest::prefer(ours, theirs))
        }
        _ => None,
    }
}

/// The free runway matching an airplane's size class, if any.
///
/// Large airplanes match only the long runway; regular airplanes take the
/// short one when free and fall back to the long one.
pub fn match_runway(free: &[bool; RUNWAY_COUNT], size: AirplaneSize) -> Option<Runway> {
    match size {
        AirplaneSize::Large => free[Runway::Long.index()].then_some(Runway::Long),
        AirplaneSize::Regular => {
            if free[Runway::Short.index()] {
                Some(Runway::Short)
            } else if free[Runway::Long.index()] {
                Some(Runway::Long)
            } else {
                None
            }
        }
    }
}

/// Builds a controller's local proposal for this round.
///
/// Scans emergencies first, then normal requests, oldest-first, tentatively
/// assigning runways from a working copy of the availability vector. Any
/// runway that is actually unavailable is then overwritten with
/// [`RunwayClaim::InProgress`], so an occupied runway is never offered to a
/// new request.
pub fn local_proposal(
    availability: &[bool; RUNWAY_COUNT],
    storage: &LandingRequestStorage,
) -> Proposal {
    let mut working = *availability;
    let mut proposal = Proposal::new();

    for request in storage.in_priority_order() {
        if !working.iter().any(|free| *free) {
            break;
        }
        if let Some(runway) = match_runway(&working, request.size) {
            proposal.insert(runway, RunwayClaim::Candidate(request.clone()));
            working[runway.index()] = false;
        }
    }

    for runway in Runway::all() {
        if !availability[runway.index()] {
            proposal.insert(runway, RunwayClaim::InProgress);
        }
    }
    proposal
}

/// Merges this controller's proposal with its peer's answer.
///
/// Per runway: a local-only entry is kept; when both sides claim the runway,
/// the local entry survives only if the tie-break selects it. A dropped entry
/// is simply postponed: the request stays in intake storage and is retried
/// in a later round.
pub fn merge(local: &Proposal, peer: &Proposal) -> Proposal {
    let mut merged = Proposal::new();
    for runway in Runway::all() {
        let Some(ours) = local.get(runway) else {
            continue;
        };
        let keep = match peer.get(runway) {
            None => true,
            Some(theirs) => match select_more_preferable(ours, theirs) {
                Some(winner) => ours
                    .candidate()
                    .is_some_and(|request| request.airplane == winner.airplane),
                None => false,
            },
        };
        if keep {
            merged.insert(runway, ours.clone());
        }
    }
    merged
}

/// Single-slot rendezvous cell carrying the peer controller's proposal.
///
/// The slot is either empty or full; a put into a full slot fails and hands
/// the value back, so an unconsumed proposal can never be silently
/// overwritten. The round sequence (send, await answer, clear own slot)
/// keeps at most one proposal per peer in flight.
#[derive(Debug, Default)]
pub struct ProposalSlot {
    slot: Mutex<Option<Proposal>>,
    filled: Notify,
    drained: Notify,
}

impl ProposalSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `proposal` if the slot is empty; hands it back otherwise.
    pub fn try_put(&self, proposal: Proposal) -> std::result::Result<(), Proposal> {
        {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            if slot.is_some() {
                return Err(proposal);
            }
            *slot = Some(proposal);
        }
        self.filled.notify_one();
        Ok(())
    }

    /// Stores `proposal`, waiting for the slot to drain first if needed.
    pub async fn put(&self, proposal: Proposal) {
        let mut pending = proposal;
        loop {
            let drained = self.drained.notified();
            match self.try_put(pending) {
                Ok(()) => return,
                Err(back) => {
                    pending = back;
                    drained.await;
                }
            }
        }
    }

    /// Waits until the slot is full and returns a copy of its proposal,
    /// leaving the slot full. The reader clears it separately once the
    /// proposal has been consumed.
    pub async fn wait_full(&self) -> Proposal {
        loop {
            let filled = self.filled.notified();
            if let Some(proposal) = self.peek() {
                return proposal;
            }
            filled.await;
        }
    }

    fn peek(&self) -> Option<Proposal> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_full(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Empties a full slot; returns whether anything was cleared.
    pub fn clear(&self) -> bool {
        let cleared = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            slot.take().is_some()
        };
        if cleared {
            self.drained.notify_one();
        }
        cleared
    }
}
