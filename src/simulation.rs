//! Simulation orchestrator.
//!
//! Wires the registry, runways, two traffic controllers, and one task per
//! airplane, then waits for the fleet to finish and shuts the controllers
//! down. Reports come back in fleet order regardless of landing order.

use crate::airplane::Airplane;
use crate::comms::{Communicator, CONTROLLER_COUNT};
use crate::config::{AirplaneDescriptor, Timing};
use crate::controller::TrafficController;
use crate::inbox;
use crate::proposal::ProposalSlot;
use crate::report::LandingReport;
use crate::runway::RunwayState;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct Simulation {
    fleet: Vec<AirplaneDescriptor>,
    timing: Timing,
}

impl Simulation {
    pub fn new(fleet: Vec<AirplaneDescriptor>) -> Self {
        Self {
            fleet,
            timing: Timing::default(),
        }
    }

    /// Overrides the clock scale, mainly to keep tests fast.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Runs the whole simulation to completion.
    pub async fn run(self) -> Vec<LandingReport> {
        let communicator = Arc::new(Communicator::new());
        let runways = Arc::new(RunwayState::new());

        let mut controllers = Vec::with_capacity(CONTROLLER_COUNT);
        for controller_id in 0..CONTROLLER_COUNT {
            let (tx, controller_inbox) = inbox::channel();
            let slot = Arc::new(ProposalSlot::new());
            communicator.register_controller(controller_id, tx, Arc::clone(&slot));
            controllers.push(TrafficController::new(
                controller_id,
                communicator.clone(),
                controller_inbox,
                slot,
                communicator.shutdown_signal(),
                self.timing,
            ));
        }
        // Spawned only after both are registered, so neither can catch its
        // peer missing from the registry.
        let controller_handles: Vec<JoinHandle<crate::error::Result<()>>> = controllers
            .into_iter()
            .map(|controller| tokio::spawn(controller.run()))
            .collect();

        let mut airplanes = Vec::with_capacity(self.fleet.len());
        for descriptor in &self.fleet {
            let (tx, rx) = mpsc::unbounded_channel();
            let landed = Arc::new(AtomicBool::new(false));
            communicator.register_airplane(descriptor.clone(), tx, Arc::clone(&landed));
            let airplane = Airplane::new(
                descriptor.clone(),
                communicator.clone(),
                rx,
                Arc::clone(&runways),
                landed,
                self.timing,
            );
            airplanes.push((descriptor.clone(), tokio::spawn(airplane.run())));
        }
        tracing::info!(
            airplanes = self.fleet.len(),
            controllers = CONTROLLER_COUNT,
            "simulation started"
        );

        let mut reports = Vec::with_capacity(airplanes.len());
        for (descriptor, handle) in airplanes {
            let report = match handle.await {
                Ok(Ok(report)) => report,
                Ok(Err(error)) => {
                    tracing::error!(airplane = %descriptor.name, %error, "airplane run failed");
                    LandingReport::not_landed(&descriptor.name, descriptor.arrival_offset_secs)
                }
                Err(join_error) => {
                    tracing::error!(airplane = %descriptor.name, %join_error, "airplane task panicked");
                    LandingReport::not_landed(&descriptor.name, descriptor.arrival_offset_secs)
                }
            };
            reports.push(report);
        }

        // Normally the controllers have already noticed the fleet is down
        // during a synchronization; this covers runs where no exchange
        // happened after the last touchdown.
        communicator.broadcast_termination();
        for handle in controller_handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => tracing::error!(%error, "traffic controller failed"),
                Err(join_error) => tracing::error!(%join_error, "traffic controller panicked"),
            }
        }
        tracing::info!("simulation finished");

        reports
    }
}
