//! Decentralized air-traffic landing coordination simulator.
//!
//! A fleet of airplane tasks competes for two runways under the authority of
//! exactly two traffic controllers. There is no central scheduler: each
//! controller builds a landing proposal from its own request storage and
//! runway view, exchanges it with its peer, and only executes the
//! assignments both sides agree on.
//!
//! Core pieces:
//! - [`config`]: fleet file loader and simulated-time knobs
//! - [`comms`]: actor registry, message routing, round-robin dispatch,
//!   termination
//! - [`inbox`]: priority mailbox the controllers consume
//! - [`proposal`]: proposal construction, peer merge, and the one-slot
//!   rendezvous used for the exchange
//! - [`airplane`] / [`controller`]: the two actor types
//! - [`simulation`]: wiring and lifecycle
//!
//! ```no_run
//! use atc_sim::config::AirplaneDescriptor;
//! use atc_sim::config::{AirplaneSize, Urgency};
//! use atc_sim::simulation::Simulation;
//!
//! # async fn demo() {
//! let fleet = vec![AirplaneDescriptor {
//!     name: "Plane-1".to_string(),
//!     size: AirplaneSize::Regular,
//!     urgency: Urgency::Normal,
//!     arrival_offset_secs: 3,
//! }];
//! let reports = Simulation::new(fleet).run().await;
//! assert!(reports[0].landed);
//! # }
//! ```

pub mod airplane;
pub mod comms;
pub mod config;
pub mod controller;
pub mod error;
pub mod inbox;
pub mod message;
pub mod proposal;
pub mod report;
pub mod request;
pub mod runway;
pub mod simulation;

pub use error::{AtcError, Result};
pub use report::LandingReport;
pub use simulation::Simulation;
