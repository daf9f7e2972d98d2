//! End-to-end simulation runs with a scaled-down clock.
//!
//! Arrival order and controller pairing are scheduling-dependent, so these
//! tests only assert the outcomes the protocol guarantees on every
//! interleaving: everyone lands, large airplanes only use the long runway,
//! and reports come back in fleet order.

use atc_sim::config::{AirplaneDescriptor, AirplaneSize, Timing, Urgency};
use atc_sim::report::LandingReport;
use atc_sim::simulation::Simulation;
use std::time::Duration;

fn fast_timing() -> Timing {
    Timing {
        second: Duration::from_millis(50),
        idle_poll: Duration::from_millis(20),
    }
}

fn plane(
    name: &str,
    size: AirplaneSize,
    urgency: Urgency,
    arrival_offset_secs: u64,
) -> AirplaneDescriptor {
    AirplaneDescriptor {
        name: name.to_string(),
        size,
        urgency,
        arrival_offset_secs,
    }
}

async fn run(fleet: Vec<AirplaneDescriptor>) -> Vec<LandingReport> {
    tokio::time::timeout(
        Duration::from_secs(30),
        Simulation::new(fleet).with_timing(fast_timing()).run(),
    )
    .await
    .expect("simulation must terminate")
}

#[tokio::test]
async fn empty_fleet_terminates_immediately() {
    let reports = run(Vec::new()).await;
    assert!(reports.is_empty());
}

#[tokio::test]
async fn lone_regular_airplane_gets_the_short_runway() {
    let reports = run(vec![plane(
        "Plane-1",
        AirplaneSize::Regular,
        Urgency::Normal,
        0,
    )])
    .await;

    assert_eq!(reports.len(), 1);
    assert!(reports[0].landed);
    assert_eq!(reports[0].chosen_runway, Some(0));
    assert!(reports[0].execution_time_secs.is_some());
}

#[tokio::test]
async fn lone_large_airplane_gets_the_long_runway() {
    let reports = run(vec![plane(
        "Heavy-1",
        AirplaneSize::Large,
        Urgency::Normal,
        0,
    )])
    .await;

    assert_eq!(reports.len(), 1);
    assert!(reports[0].landed);
    assert_eq!(reports[0].chosen_runway, Some(1));
}

#[tokio::test]
async fn large_airplanes_serialize_on_the_long_runway() {
    let reports = run(vec![
        plane("Heavy-1", AirplaneSize::Large, Urgency::Normal, 0),
        plane("Heavy-2", AirplaneSize::Large, Urgency::Normal, 0),
    ])
    .await;

    assert!(reports.iter().all(|r| r.landed));
    assert!(reports.iter().all(|r| r.chosen_runway == Some(1)));
    // They cannot overlap, so one of them spent at least a full extra
    // landing maneuver circling.
    let mut times: Vec<u64> = reports
        .iter()
        .map(|r| r.execution_time_secs.unwrap())
        .collect();
    times.sort_unstable();
    assert!(times[1] >= times[0] + AirplaneSize::Large.landing_secs());
}

#[tokio::test]
async fn emergency_airplane_still_lands_among_normal_traffic() {
    let reports = run(vec![
        plane("Plane-1", AirplaneSize::Regular, Urgency::Normal, 0),
        plane("Mayday-1", AirplaneSize::Regular, Urgency::Emergency, 0),
        plane("Plane-2", AirplaneSize::Regular, Urgency::Normal, 0),
    ])
    .await;

    assert!(reports.iter().all(|r| r.landed));
    let mayday = reports.iter().find(|r| r.airplane_name == "Mayday-1").unwrap();
    assert!(mayday.chosen_runway.is_some());
}

#[tokio::test]
async fn five_airplane_fleet_all_land_and_report_in_fleet_order() {
    let fleet = vec![
        plane("Plane-1", AirplaneSize::Regular, Urgency::Normal, 3),
        plane("Plane-2", AirplaneSize::Regular, Urgency::Normal, 4),
        plane("Plane-3", AirplaneSize::Regular, Urgency::Normal, 4),
        plane("Plane-4", AirplaneSize::Regular, Urgency::Normal, 4),
        plane("Plane-5", AirplaneSize::Regular, Urgency::Normal, 5),
    ];
    let names: Vec<String> = fleet.iter().map(|p| p.name.clone()).collect();

    let reports = run(fleet).await;

    assert_eq!(
        reports.iter().map(|r| r.airplane_name.clone()).collect::<Vec<_>>(),
        names
    );
    assert!(reports.iter().all(|r| r.landed));

    // The first arrival finds both runways free and always gets the short
    // one. The three same-offset arrivals race for processing order, but
    // the runway usage pattern is fixed: a freed runway is immediately
    // reassigned while airplanes circle, so three landings go to the short
    // runway and two to the long one on every interleaving.
    assert_eq!(reports[0].chosen_runway, Some(0));
    let mut runways: Vec<usize> = reports
        .iter()
        .map(|r| r.chosen_runway.unwrap())
        .collect();
    runways.sort_unstable();
    assert_eq!(runways, [0, 0, 0, 1, 1]);
    assert_eq!(reports[0].start_offset_secs, 3);
}
