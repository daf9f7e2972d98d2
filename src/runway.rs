//! Runway identifiers and the shared occupancy guard.
//!
//! `RunwayState` is the one piece of state airplanes touch directly. It is
//! deliberately outside both actors' views: controllers track availability
//! from messages alone, and this guard exists to catch the critical case
//! where two airplanes are ordered onto the same runway at the same time.

use crate::error::{AtcError, Result};
use std::fmt;
use std::sync::Mutex;

/// Number of runways at the simulated airport.
pub const RUNWAY_COUNT: usize = 2;

/// One of the two runways, ordered by index.
///
/// Large airplanes can only land on [`Runway::Long`]; regular airplanes
/// prefer [`Runway::Short`] and fall back to the long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runway {
    Short = 0,
    Long = 1,
}

impl Runway {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Runway> {
        match index {
            0 => Some(Runway::Short),
            1 => Some(Runway::Long),
            _ => None,
        }
    }

    /// Both runways in index order.
    pub fn all() -> [Runway; RUNWAY_COUNT] {
        [Runway::Short, Runway::Long]
    }
}

impl fmt::Display for Runway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runway::Short => write!(f, "SHORT"),
            Runway::Long => write!(f, "LONG"),
        }
    }
}

/// Mutually-exclusive occupancy tracking, one slot per runway.
///
/// A slot holds the occupying airplane's name, or `None` when the runway is
/// free. `occupy` and `release` are atomic with respect to each other across
/// all airplane tasks.
#[derive(Debug, Default)]
pub struct RunwayState {
    slots: Mutex<[Option<String>; RUNWAY_COUNT]>,
}

impl RunwayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims exclusive occupancy of `runway` for `airplane`.
    ///
    /// An already-occupied slot means two airplanes were assigned the same
    /// runway. That is a correctness violation of the coordination protocol,
    /// so it is returned as a fatal error rather than retried.
    pub fn occupy(&self, airplane: &str, runway: Runway) -> Result<()> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(occupant) = &slots[runway.index()] {
            tracing::error!(
                %runway,
                occupant,
                airplane,
                "airplanes crashed: runway was occupied when another airplane started landing"
            );
            return Err(AtcError::RunwayCollision {
                runway,
                occupant: occupant.clone(),
                airplane: airplane.to_string(),
            });
        }
        slots[runway.index()] = Some(airplane.to_string());
        Ok(())
    }

    /// Marks `runway` free again after a completed landing.
    pub fn release(&self, runway: Runway) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots[runway.index()] = None;
    }

    /// Current occupant of `runway`, if any.
    pub fn occupant(&self, runway: Runway) -> Option<String> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots[runway.index()].clone()
    }
}
