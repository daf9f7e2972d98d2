//! The traffic-controller actor.
//!
//! Each of the two controllers consumes its priority inbox, keeps a private
//! view of runway availability, and agrees with its peer on every assignment
//! through the decision-round exchange before ordering an airplane down.
//! The availability view is only ever mutated by messages this controller
//! itself processes.

use crate::comms::{shutdown_signalled, ControllerCommunicator};
use crate::config::Timing;
use crate::error::Result;
use crate::inbox::{InboxWait, PriorityInbox};
use crate::message::{self, Message, MessageKind, Participant};
use crate::proposal::{local_proposal, merge, Proposal, ProposalSlot};
use crate::request::{LandingRequest, LandingRequestStorage};
use crate::runway::RUNWAY_COUNT;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

pub struct TrafficController {
    id: usize,
    comms: Arc<dyn ControllerCommunicator>,
    inbox: PriorityInbox,
    /// Where the peer's proposal arrives; bypasses the priority inbox.
    slot: Arc<ProposalSlot>,
    shutdown: watch::Receiver<bool>,
    storage: LandingRequestStorage,
    /// Local availability view: both runways free at start.
    availability: [bool; RUNWAY_COUNT],
    timing: Timing,
}

impl TrafficController {
    pub fn new(
        id: usize,
        comms: Arc<dyn ControllerCommunicator>,
        inbox: PriorityInbox,
        slot: Arc<ProposalSlot>,
        shutdown: watch::Receiver<bool>,
        timing: Timing,
    ) -> Self {
        Self {
            id,
            comms,
            inbox,
            slot,
            shutdown,
            storage: LandingRequestStorage::new(),
            availability: [true; RUNWAY_COUNT],
            timing,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Runs until terminated. Any error escaping here stops this controller
    /// for good, which stalls the peer's exchanges; the caller logs it.
    pub async fn run(mut self) -> Result<()> {
        tracing::debug!(controller = self.id, "traffic controller started");
        loop {
            self.inbox.drain_pending();
            if let Some(mail) = self.inbox.pop() {
                match mail.kind {
                    MessageKind::Terminated => {
                        tracing::debug!(controller = self.id, "traffic controller terminated");
                        return Ok(());
                    }
                    MessageKind::ReadyToLand | MessageKind::EmergencyCallToLand => {
                        self.handle_landing_request(&mail).await?;
                    }
                    MessageKind::LandingApproved => self.handle_landing_approved(&mail)?,
                    other => {
                        tracing::warn!(controller = self.id, ?other, "unexpected message kind");
                    }
                }
                continue;
            }

            // No mail: give new arrivals one idle interval, then re-check the
            // pending proposals anyway; a runway may have freed up with no
            // new request to trigger a round.
            match self.inbox.wait_for_message(self.timing.idle_poll).await {
                InboxWait::Message => {}
                InboxWait::Closed => return Ok(()),
                InboxWait::TimedOut => {
                    let decided = self.decision_round().await?;
                    self.execute_proposals(&decided).await?;
                }
            }
        }
    }

    /// Accepts a landing request into intake storage and runs a decision
    /// round. If the new request did not make it into this round's
    /// executable set, the airplane is told to circle.
    async fn handle_landing_request(&mut self, mail: &Message) -> Result<()> {
        let Participant::Airplane(sender) = &mail.sender else {
            tracing::warn!(controller = self.id, %mail, "landing request without an airplane sender");
            return Ok(());
        };
        let descriptor = self.comms.descriptor(sender)?;
        self.storage.push(LandingRequest {
            airplane: descriptor.name.clone(),
            size: descriptor.size,
            urgency: descriptor.urgency,
            requested_at: Instant::now(),
        });

        let decided = self.decision_round().await?;
        if !decided.contains_airplane(&descriptor.name) {
            self.comms
                .send_to_airplane(
                    self.id,
                    &descriptor.name,
                    MessageKind::WaitingAround,
                    message::PLEASE_CIRCLE_AROUND_THE_AIRPORT.to_string(),
                )
                .await?;
        }
        self.execute_proposals(&decided).await
    }

    /// A confirmed landing frees its runway in the local view.
    fn handle_landing_approved(&mut self, mail: &Message) -> Result<()> {
        let runway = message::runway_from_text(&mail.text)?;
        self.availability[runway.index()] = true;
        tracing::debug!(controller = self.id, %runway, "runway released");
        Ok(())
    }

    /// One decision round: build the local proposal, exchange it with the
    /// peer, and merge the two into the set this controller may execute.
    async fn decision_round(&mut self) -> Result<Proposal> {
        let local = local_proposal(&self.availability, &self.storage);
        self.comms.synchronize_proposals(self.id, local.clone()).await?;

        let slot = Arc::clone(&self.slot);
        let peer = tokio::select! {
            proposal = slot.wait_full() => proposal,
            // A terminated peer will never answer; abandon the round and let
            // the inbox drain pick up the termination order.
            _ = shutdown_signalled(&mut self.shutdown) => {
                self.slot.clear();
                return Ok(Proposal::new());
            }
        };

        let decided = merge(&local, &peer);
        self.slot.clear();
        Ok(decided)
    }

    /// Orders every winning candidate down, marks its runway unavailable in
    /// the local view, and drops the request from intake storage.
    async fn execute_proposals(&mut self, decided: &Proposal) -> Result<()> {
        for (runway, claim) in decided.iter() {
            let Some(request) = claim.candidate() else {
                continue;
            };
            self.comms
                .send_to_airplane(
                    self.id,
                    &request.airplane,
                    MessageKind::LandOnARunway,
                    message::land_on_runway_text(runway),
                )
                .await?;
            self.availability[runway.index()] = false;
            self.storage.remove(&request.airplane);
        }
        Ok(())
    }
}
