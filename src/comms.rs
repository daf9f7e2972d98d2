//! The communicator: identity registry, message router, and termination
//! sentinel. It carries no landing logic of its own.
//!
//! Airplanes and controllers each see only the facet of the communicator
//! they need, expressed as the [`AirplaneCommunicator`] and
//! [`ControllerCommunicator`] traits; both actors hold it as a trait object
//! so tests can substitute doubles.

use crate::config::{AirplaneDescriptor, Urgency};
use crate::error::{AtcError, Result};
use crate::message::{self, Message, MessageKind, Participant};
use crate::proposal::{Proposal, ProposalSlot};
use crate::runway::Runway;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// The synchronization protocol is a two-party exchange: each controller's
/// peer is `1 - id`, and that arithmetic is only correct for exactly two
/// controllers. Kept fixed on purpose.
pub const CONTROLLER_COUNT: usize = 2;

/// The other controller of the pair.
pub fn peer_of(controller_id: usize) -> usize {
    1 - controller_id
}

/// The communicator facet airplanes use.
#[async_trait]
pub trait AirplaneCommunicator: Send + Sync {
    /// Routes a landing request to a round-robin-selected controller and
    /// returns that controller's id.
    async fn request_landing(&self, airplane: &str) -> Result<usize>;

    /// Reports a completed landing back to the controller that ordered it.
    async fn confirm_landing(&self, controller_id: usize, airplane: &str, runway: Runway)
        -> Result<()>;
}

/// The communicator facet traffic controllers use.
#[async_trait]
pub trait ControllerCommunicator: Send + Sync {
    /// Resolves a sender identity back to its registered descriptor.
    fn descriptor(&self, airplane: &str) -> Result<AirplaneDescriptor>;

    /// Delivers a circle-around or land order to an airplane's inbox.
    async fn send_to_airplane(
        &self,
        controller_id: usize,
        airplane: &str,
        kind: MessageKind,
        text: String,
    ) -> Result<()>;

    /// Hands this round's proposal to the peer controller. Checks for global
    /// termination first and broadcasts it when every airplane has landed.
    async fn synchronize_proposals(&self, controller_id: usize, proposal: Proposal) -> Result<()>;
}

struct AirplaneEntry {
    descriptor: AirplaneDescriptor,
    inbox: mpsc::UnboundedSender<Message>,
    landed: Arc<AtomicBool>,
}

struct ControllerEntry {
    inbox: mpsc::UnboundedSender<Message>,
    slot: Arc<ProposalSlot>,
}

/// Central registry and router, shared by every actor as `Arc<Communicator>`.
pub struct Communicator {
    airplanes: DashMap<String, AirplaneEntry>,
    controllers: DashMap<usize, ControllerEntry>,
    round_robin: AtomicUsize,
    shutdown: watch::Sender<bool>,
}

impl Communicator {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            airplanes: DashMap::new(),
            controllers: DashMap::new(),
            round_robin: AtomicUsize::new(0),
            shutdown,
        }
    }

    /// Registers an airplane's mailbox and landed flag under its name.
    pub fn register_airplane(
        &self,
        descriptor: AirplaneDescriptor,
        inbox: mpsc::UnboundedSender<Message>,
        landed: Arc<AtomicBool>,
    ) {
        self.airplanes.insert(
            descriptor.name.clone(),
            AirplaneEntry {
                descriptor,
                inbox,
                landed,
            },
        );
    }

    /// Registers a controller's mailbox and proposal slot under its id.
    pub fn register_controller(
        &self,
        controller_id: usize,
        inbox: mpsc::UnboundedSender<Message>,
        slot: Arc<ProposalSlot>,
    ) {
        self.controllers
            .insert(controller_id, ControllerEntry { inbox, slot });
    }

    /// A receiver that flips to `true` once termination has been broadcast.
    /// Blocking protocol waits watch it so a terminated peer cannot strand
    /// them.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Sends `Terminated` to both controllers and raises the shutdown
    /// signal. Idempotent: duplicates are tolerated by the receivers.
    pub fn broadcast_termination(&self) {
        for controller_id in 0..CONTROLLER_COUNT {
            if let Some(entry) = self.controllers.get(&controller_id) {
                let terminated = Message::new(
                    MessageKind::Terminated,
                    "All airplanes have landed.",
                    Participant::Dispatcher,
                    Participant::Controller(controller_id),
                );
                // A controller that already exited dropped its receiver;
                // that is exactly the terminated state, so ignore the error.
                let _ = entry.inbox.send(terminated);
            }
        }
        let _ = self.shutdown.send(true);
    }

    fn all_landed(&self) -> bool {
        !self.airplanes.is_empty()
            && self
                .airplanes
                .iter()
                .all(|entry| entry.landed.load(Ordering::SeqCst))
    }

    fn deliver_to_controller(&self, controller_id: usize, message: Message) -> Result<()> {
        let entry = self
            .controllers
            .get(&controller_id)
            .ok_or(AtcError::UnknownController(controller_id))?;
        tracing::info!("{message}");
        entry
            .inbox
            .send(message)
            .map_err(|_| AtcError::MailboxClosed(format!("Traffic controller {controller_id}")))
    }
}

impl Default for Communicator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AirplaneCommunicator for Communicator {
    async fn request_landing(&self, airplane: &str) -> Result<usize> {
        // One atomic step, so two concurrent requests can never both get the
        // same controller out of turn.
        let controller_id = self.round_robin.fetch_add(1, Ordering::SeqCst) % CONTROLLER_COUNT;

        let urgency = self
            .airplanes
            .get(airplane)
            .ok_or_else(|| AtcError::UnknownAirplane(airplane.to_string()))?
            .descriptor
            .urgency;
        let (kind, text) = match urgency {
            Urgency::Emergency => (MessageKind::EmergencyCallToLand, message::MAYDAY),
            Urgency::Normal => (MessageKind::ReadyToLand, message::READY_TO_LAND),
        };

        let request = Message::new(
            kind,
            text,
            Participant::Airplane(airplane.to_string()),
            Participant::Controller(controller_id),
        );
        self.deliver_to_controller(controller_id, request)?;
        Ok(controller_id)
    }

    async fn confirm_landing(
        &self,
        controller_id: usize,
        airplane: &str,
        runway: Runway,
    ) -> Result<()> {
        let confirmation = Message::new(
            MessageKind::LandingApproved,
            message::landed_on_runway_text(runway),
            Participant::Airplane(airplane.to_string()),
            Participant::Controller(controller_id),
        );
        self.deliver_to_controller(controller_id, confirmation)
    }
}

#[async_trait]
impl ControllerCommunicator for Communicator {
    fn descriptor(&self, airplane: &str) -> Result<AirplaneDescriptor> {
        self.airplanes
            .get(airplane)
            .map(|entry| entry.descriptor.clone())
            .ok_or_else(|| AtcError::UnknownAirplane(airplane.to_string()))
    }

    async fn send_to_airplane(
        &self,
        controller_id: usize,
        airplane: &str,
        kind: MessageKind,
        text: String,
    ) -> Result<()> {
        let entry = self
            .airplanes
            .get(airplane)
            .ok_or_else(|| AtcError::UnknownAirplane(airplane.to_string()))?;
        let response = Message::new(
            kind,
            text,
            Participant::Controller(controller_id),
            Participant::Airplane(airplane.to_string()),
        );
        tracing::info!("{response}");
        entry
            .inbox
            .send(response)
            .map_err(|_| AtcError::MailboxClosed(airplane.to_string()))
    }

    async fn synchronize_proposals(&self, controller_id: usize, proposal: Proposal) -> Result<()> {
        // Once the whole fleet is down there is nothing left to decide:
        // order both controllers to stop. Duplicate broadcasts are fine.
        if self.all_landed() {
            self.broadcast_termination();
        }

        let peer = peer_of(controller_id);
        let slot = {
            let entry = self
                .controllers
                .get(&peer)
                .ok_or(AtcError::UnknownController(peer))?;
            Arc::clone(&entry.slot)
        };
        tracing::info!(
            from = controller_id,
            to = peer,
            "synchronising landing proposals"
        );

        // The slot refuses to overwrite an unconsumed proposal, so keep
        // retrying until the peer drains it. Give up once termination has
        // been signalled: an exited peer will never drain its slot.
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            let _ = slot.try_put(proposal);
            return Ok(());
        }
        tokio::select! {
            _ = slot.put(proposal) => {}
            _ = shutdown.changed() => {}
        }
        Ok(())
    }
}

/// Resolves once the shutdown signal reads `true` (or its sender is gone).
pub async fn shutdown_signalled(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AirplaneSize;

    fn descriptor(name: &str, urgency: Urgency) -> AirplaneDescriptor {
        AirplaneDescriptor {
            name: name.to_string(),
            size: AirplaneSize::Regular,
            urgency,
            arrival_offset_secs: 0,
        }
    }

    struct Registered {
        communicator: Arc<Communicator>,
        controller_rx: Vec<mpsc::UnboundedReceiver<Message>>,
        slots: Vec<Arc<ProposalSlot>>,
    }

    fn registry_with_two_controllers() -> Registered {
        let communicator = Arc::new(Communicator::new());
        let mut controller_rx = Vec::new();
        let mut slots = Vec::new();
        for controller_id in 0..CONTROLLER_COUNT {
            let (tx, rx) = mpsc::unbounded_channel();
            let slot = Arc::new(ProposalSlot::new());
            communicator.register_controller(controller_id, tx, Arc::clone(&slot));
            controller_rx.push(rx);
            slots.push(slot);
        }
        Registered {
            communicator,
            controller_rx,
            slots,
        }
    }

    fn register_airplane(
        communicator: &Communicator,
        descriptor: AirplaneDescriptor,
        landed: bool,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        communicator.register_airplane(descriptor, tx, Arc::new(AtomicBool::new(landed)));
        rx
    }

    #[tokio::test]
    async fn round_robin_alternates_strictly() {
        let mut registry = registry_with_two_controllers();
        let _rx = register_airplane(
            &registry.communicator,
            descriptor("Plane-1", Urgency::Normal),
            false,
        );

        let mut ids = Vec::new();
        for _ in 0..6 {
            ids.push(registry.communicator.request_landing("Plane-1").await.unwrap());
        }
        assert_eq!(ids, [0, 1, 0, 1, 0, 1]);

        // Each request landed in the matching controller inbox.
        assert_eq!(
            registry.controller_rx[0].recv().await.unwrap().kind,
            MessageKind::ReadyToLand
        );
        assert_eq!(
            registry.controller_rx[1].recv().await.unwrap().kind,
            MessageKind::ReadyToLand
        );
    }

    #[tokio::test]
    async fn urgency_selects_the_request_kind() {
        let mut registry = registry_with_two_controllers();
        let _rx = register_airplane(
            &registry.communicator,
            descriptor("Mayday-1", Urgency::Emergency),
            false,
        );

        registry.communicator.request_landing("Mayday-1").await.unwrap();
        let message = registry.controller_rx[0].recv().await.unwrap();
        assert_eq!(message.kind, MessageKind::EmergencyCallToLand);
        assert_eq!(message.text, message::MAYDAY);
        assert_eq!(message.sender, Participant::Airplane("Mayday-1".to_string()));
    }

    #[tokio::test]
    async fn unregistered_airplane_is_rejected() {
        let registry = registry_with_two_controllers();
        let err = registry.communicator.request_landing("Ghost").await.unwrap_err();
        assert!(matches!(err, AtcError::UnknownAirplane(_)));
    }

    #[tokio::test]
    async fn synchronization_goes_to_the_peer_slot() {
        let registry = registry_with_two_controllers();
        let _rx = register_airplane(
            &registry.communicator,
            descriptor("Plane-1", Urgency::Normal),
            false,
        );

        registry
            .communicator
            .synchronize_proposals(0, Proposal::new())
            .await
            .unwrap();

        // Controller 0's proposal lands in controller 1's slot only.
        assert!(registry.slots[1].is_full());
        assert!(!registry.slots[0].is_full());
    }

    #[tokio::test]
    async fn termination_broadcasts_to_both_controllers_when_fleet_is_down() {
        let mut registry = registry_with_two_controllers();
        let _rx = register_airplane(
            &registry.communicator,
            descriptor("Plane-1", Urgency::Normal),
            true,
        );

        // Two rounds in a row: the broadcast must be idempotent.
        for _ in 0..2 {
            registry
                .communicator
                .synchronize_proposals(0, Proposal::new())
                .await
                .unwrap();
        }

        for rx in &mut registry.controller_rx {
            let kinds: Vec<MessageKind> =
                std::iter::from_fn(|| rx.try_recv().ok()).map(|m| m.kind).collect();
            assert!(kinds.contains(&MessageKind::Terminated));
        }
        assert!(*registry.communicator.shutdown_signal().borrow());
    }

    #[tokio::test]
    async fn no_termination_while_an_airplane_is_still_up() {
        let mut registry = registry_with_two_controllers();
        let _rx1 = register_airplane(
            &registry.communicator,
            descriptor("Plane-1", Urgency::Normal),
            true,
        );
        let _rx2 = register_airplane(
            &registry.communicator,
            descriptor("Plane-2", Urgency::Normal),
            false,
        );

        registry
            .communicator
            .synchronize_proposals(1, Proposal::new())
            .await
            .unwrap();

        assert!(registry.controller_rx[0].try_recv().is_err());
        assert!(registry.controller_rx[1].try_recv().is_err());
        assert!(!*registry.communicator.shutdown_signal().borrow());
    }
}
