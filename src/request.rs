//! Landing requests and the per-controller intake storage.

use crate::config::{AirplaneSize, Urgency};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::time::Instant;

/// A landing request accepted by a controller, awaiting a decision.
///
/// The creation timestamp breaks ties between equally urgent requests when
/// the two controllers propose different airplanes for the same runway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingRequest {
    pub airplane: String,
    pub size: AirplaneSize,
    pub urgency: Urgency,
    pub requested_at: Instant,
}

impl LandingRequest {
    /// The more preferable of two real requests: emergencies beat normal
    /// landings, within equal urgency the earlier request wins, and an exact
    /// timestamp tie falls back to the airplane name.
    ///
    /// Every tie must resolve the same way on both sides of the exchange, or
    /// the two controllers would each keep their own candidate for the same
    /// runway.
    pub fn prefer<'a>(a: &'a LandingRequest, b: &'a LandingRequest) -> &'a LandingRequest {
        if a.urgency != b.urgency {
            return if a.urgency == Urgency::Emergency { a } else { b };
        }
        match a.requested_at.cmp(&b.requested_at) {
            Ordering::Less => a,
            Ordering::Greater => b,
            Ordering::Equal => {
                if a.airplane <= b.airplane {
                    a
                } else {
                    b
                }
            }
        }
    }
}

/// Two priority-ordered intake queues, FIFO within each class.
///
/// A request leaves the storage only when it is selected for execution; a
/// postponed proposal keeps its request queued and is retried next round.
#[derive(Debug, Default)]
pub struct LandingRequestStorage {
    emergency: VecDeque<LandingRequest>,
    normal: VecDeque<LandingRequest>,
}

impl LandingRequestStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: LandingRequest) {
        match request.urgency {
            Urgency::Emergency => self.emergency.push_back(request),
            Urgency::Normal => self.normal.push_back(request),
        }
    }

    /// All pending requests, emergencies first, oldest-first within a class.
    pub fn in_priority_order(&self) -> impl Iterator<Item = &LandingRequest> {
        self.emergency.iter().chain(self.normal.iter())
    }

    /// Removes the request of `airplane` from whichever queue holds it.
    pub fn remove(&mut self, airplane: &str) {
        self.emergency.retain(|request| request.airplane != airplane);
        self.normal.retain(|request| request.airplane != airplane);
    }

    pub fn is_empty(&self) -> bool {
        self.emergency.is_empty() && self.normal.is_empty()
    }

    pub fn len(&self) -> usize {
        self.emergency.len() + self.normal.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(airplane: &str, urgency: Urgency, requested_at: Instant) -> LandingRequest {
        LandingRequest {
            airplane: airplane.to_string(),
            size: AirplaneSize::Regular,
            urgency,
            requested_at,
        }
    }

    #[test]
    fn emergency_beats_normal() {
        let base = Instant::now();
        let normal = request("Plane-1", Urgency::Normal, base);
        let emergency = request("Plane-2", Urgency::Emergency, base + Duration::from_secs(10));

        // The emergency wins even though it was filed later.
        assert_eq!(LandingRequest::prefer(&normal, &emergency).airplane, "Plane-2");
        assert_eq!(LandingRequest::prefer(&emergency, &normal).airplane, "Plane-2");
    }

    #[test]
    fn earlier_request_wins_within_equal_urgency() {
        let base = Instant::now();
        let early = request("Plane-1", Urgency::Normal, base);
        let late = request("Plane-2", Urgency::Normal, base + Duration::from_millis(1));

        assert_eq!(LandingRequest::prefer(&early, &late).airplane, "Plane-1");
        assert_eq!(LandingRequest::prefer(&late, &early).airplane, "Plane-1");
    }

    #[test]
    fn identical_timestamps_fall_back_to_the_name() {
        let base = Instant::now();
        let a = request("Plane-1", Urgency::Normal, base);
        let b = request("Plane-2", Urgency::Normal, base);

        // Both sides of the exchange must name the same winner.
        assert_eq!(LandingRequest::prefer(&a, &b).airplane, "Plane-1");
        assert_eq!(LandingRequest::prefer(&b, &a).airplane, "Plane-1");
    }

    #[test]
    fn storage_orders_emergencies_first() {
        let base = Instant::now();
        let mut storage = LandingRequestStorage::new();
        storage.push(request("Plane-1", Urgency::Normal, base));
        storage.push(request("Plane-2", Urgency::Emergency, base));
        storage.push(request("Plane-3", Urgency::Normal, base));

        let order: Vec<&str> = storage
            .in_priority_order()
            .map(|r| r.airplane.as_str())
            .collect();
        assert_eq!(order, ["Plane-2", "Plane-1", "Plane-3"]);
    }

    #[test]
    fn remove_takes_the_request_from_either_queue() {
        let base = Instant::now();
        let mut storage = LandingRequestStorage::new();
        storage.push(request("Plane-1", Urgency::Normal, base));
        storage.push(request("Plane-2", Urgency::Emergency, base));
        assert_eq!(storage.len(), 2);

        storage.remove("Plane-2");
        storage.remove("Plane-1");
        assert!(storage.is_empty());

        // Removing an unknown airplane is a no-op.
        storage.remove("Plane-9");
    }
}
