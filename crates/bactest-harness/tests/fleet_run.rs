use bactest_harness::discovery::{run_sweep, DiscoveryConfig};
use bactest_harness::{
    run_fleet, CheckReporter, FleetOptions, SessionConfig, SimFleet, DEVICE_TABLE,
};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

fn base_ip() -> Ipv4Addr {
    "172.20.0.10".parse().unwrap()
}

fn session() -> SessionConfig {
    SessionConfig::new("172.20.0.100".parse().unwrap(), 24)
}

fn full_fleet() -> SimFleet {
    SimFleet::open(session()).with_devices(base_ip(), &DEVICE_TABLE)
}

#[tokio::test]
async fn full_fleet_run_passes_every_check() {
    let sim = full_fleet();
    let options = FleetOptions::new(base_ip(), DEVICE_TABLE.len()).quick();
    let mut reporter = CheckReporter::new();

    run_fleet(&sim, &options, &mut reporter).await;

    let summary = reporter.summary();
    assert_eq!(summary.failed, 0, "failures: {:?}", reporter.results());
    assert_eq!(summary.passed, 21);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.total(), reporter.results().len());
    assert!(summary.is_success());
}

#[tokio::test]
async fn device_count_three_only_requires_the_first_three_devices() {
    // The simulator presents all nine devices; the run must only demand
    // 1001, 1002 and 2001, and must not care about 2002.
    let sim = full_fleet();
    let options = FleetOptions::new(base_ip(), 3).quick();
    let mut reporter = CheckReporter::new();

    run_fleet(&sim, &options, &mut reporter).await;

    let summary = reporter.summary();
    assert_eq!(summary.failed, 0, "failures: {:?}", reporter.results());
    let discovery = reporter
        .results()
        .iter()
        .find(|r| r.label == "All 3 devices discovered")
        .expect("discovery check recorded");
    assert!(discovery.passed);
}

#[tokio::test]
async fn fleet_run_passes_under_injected_lag() {
    let sim = full_fleet().with_lag(Duration::from_millis(1), Duration::from_millis(5));
    let options = FleetOptions::new(base_ip(), DEVICE_TABLE.len()).quick();
    let mut reporter = CheckReporter::new();

    run_fleet(&sim, &options, &mut reporter).await;

    assert!(reporter.summary().is_success(), "{:?}", reporter.results());
}

#[tokio::test]
async fn discovery_sweep_terminates_at_the_attempt_bound() {
    // No devices at all: the sweep must give up after max_attempts rounds.
    let sim = SimFleet::open(session());
    let config = DiscoveryConfig {
        expected: BTreeSet::from([1001, 1002]),
        max_attempts: 5,
        settle: Duration::from_millis(1),
        targeted_fallback: None,
    };

    let outcome = run_sweep(&sim, &config).await;

    assert_eq!(outcome.attempts, 5);
    assert!(outcome.found.is_empty());
    assert_eq!(outcome.missing, BTreeSet::from([1001, 1002]));
    assert!(!outcome.is_complete());
}

#[tokio::test]
async fn discovery_sweep_stops_as_soon_as_all_devices_answer() {
    let sim = full_fleet();
    let config = DiscoveryConfig {
        expected: DEVICE_TABLE.iter().map(|d| d.device_id).collect(),
        max_attempts: 5,
        settle: Duration::from_millis(1),
        targeted_fallback: None,
    };

    let outcome = run_sweep(&sim, &config).await;

    assert_eq!(outcome.attempts, 1);
    assert!(outcome.is_complete());
}
