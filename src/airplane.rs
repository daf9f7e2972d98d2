//! The airplane actor.
//!
//! An airplane sleeps until its configured arrival time, files exactly one
//! landing request, and then follows orders from its inbox until it has
//! landed (or is told the simulation is over).

use crate::comms::AirplaneCommunicator;
use crate::config::{AirplaneDescriptor, Timing};
use crate::error::Result;
use crate::message::{self, Message, MessageKind};
use crate::report::LandingReport;
use crate::runway::RunwayState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

pub struct Airplane {
    descriptor: AirplaneDescriptor,
    comms: Arc<dyn AirplaneCommunicator>,
    inbox: mpsc::UnboundedReceiver<Message>,
    runways: Arc<RunwayState>,
    /// Shared with the registry so the communicator can detect when the
    /// whole fleet is down.
    landed: Arc<AtomicBool>,
    timing: Timing,
}

impl Airplane {
    pub fn new(
        descriptor: AirplaneDescriptor,
        comms: Arc<dyn AirplaneCommunicator>,
        inbox: mpsc::UnboundedReceiver<Message>,
        runways: Arc<RunwayState>,
        landed: Arc<AtomicBool>,
        timing: Timing,
    ) -> Self {
        Self {
            descriptor,
            comms,
            inbox,
            runways,
            landed,
            timing,
        }
    }

    /// Runs the airplane to completion and returns its landing report.
    ///
    /// A collision or an unparsable landing order is returned as an error:
    /// both mean the coordination protocol was violated and this airplane's
    /// run cannot be trusted any further.
    pub async fn run(mut self) -> Result<LandingReport> {
        tracing::debug!(airplane = %self.descriptor.name, "airplane task started");
        tokio::time::sleep(self.timing.arrival_delay(&self.descriptor)).await;
        tracing::debug!(airplane = %self.descriptor.name, "going to land");

        let started = Instant::now();
        let controller_id = self.comms.request_landing(&self.descriptor.name).await?;

        loop {
            let Some(mail) = self.inbox.recv().await else {
                // Registry gone; nothing more will ever arrive.
                return Ok(self.not_landed());
            };
            match mail.kind {
                MessageKind::Terminated => return Ok(self.not_landed()),
                MessageKind::WaitingAround => {
                    tracing::debug!(airplane = %self.descriptor.name, "circling around the airport");
                }
                MessageKind::LandOnARunway => {
                    let runway = message::runway_from_text(&mail.text)?;
                    self.runways.occupy(&self.descriptor.name, runway)?;
                    // The landing maneuver holds the runway for the whole
                    // size-class duration.
                    tokio::time::sleep(self.timing.landing_duration(self.descriptor.size)).await;
                    self.runways.release(runway);

                    self.comms
                        .confirm_landing(controller_id, &self.descriptor.name, runway)
                        .await?;
                    // The flag flips only once the confirmation is delivered;
                    // the all-landed check must never observe a landing its
                    // controller has not been told about.
                    self.landed.store(true, Ordering::SeqCst);
                    tracing::info!(
                        airplane = %self.descriptor.name,
                        %runway,
                        "landing finished"
                    );
                    return Ok(LandingReport {
                        airplane_name: self.descriptor.name.clone(),
                        landed: true,
                        chosen_runway: Some(runway.index()),
                        execution_time_secs: Some(started.elapsed().as_secs()),
                        start_offset_secs: self.descriptor.arrival_offset_secs,
                    });
                }
                other => {
                    tracing::warn!(airplane = %self.descriptor.name, ?other, "unexpected message kind");
                }
            }
        }
    }

    fn not_landed(&self) -> LandingReport {
        LandingReport::not_landed(&self.descriptor.name, self.descriptor.arrival_offset_secs)
    }
}
