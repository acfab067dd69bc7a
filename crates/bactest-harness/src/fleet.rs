//! The multi-device conformance run.
//!
//! Phases execute strictly in sequence over one capability session:
//! discovery, per-template reads, device names, write round-trips, batched
//! read, batched write, then lag timing. Each phase records its assertions on
//! the shared [`CheckReporter`]; no failure short-circuits the run.

use crate::capability::BacnetCapability;
use crate::discovery::{report_outcome, run_sweep, DiscoveryConfig};
use crate::object::{ObjectRef, ObjectType, PropertyId};
use crate::report::CheckReporter;
use crate::table::{offset_ip, DEVICE_TABLE};
use crate::timing::{
    measure_read_latency, report_latency, representative_targets, timing_section_title,
};
use crate::value::Expectation;
use crate::verify::{
    checked_read, verify_read_multiple, verify_write_multiple, verify_write_readback, WriteCheck,
    REPRESENTATIVE_TOLERANCE,
};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Knobs for a fleet run. Defaults are the values the conformance contract
/// specifies; tests shrink the settle intervals.
#[derive(Debug, Clone)]
pub struct FleetOptions {
    pub base_ip: Ipv4Addr,
    pub device_count: usize,
    pub startup_settle: Duration,
    pub discovery_settle: Duration,
    pub write_settle: Duration,
    pub timing_reads: usize,
    pub mean_read_bound: Duration,
    /// Lag profile injected at the backend, echoed in the timing header.
    pub lag_range: Option<(Duration, Duration)>,
}

impl FleetOptions {
    pub fn new(base_ip: Ipv4Addr, device_count: usize) -> Self {
        Self {
            base_ip,
            device_count,
            startup_settle: Duration::from_secs(2),
            discovery_settle: Duration::from_secs(3),
            write_settle: Duration::from_secs(1),
            timing_reads: 20,
            mean_read_bound: Duration::from_millis(500),
            lag_range: None,
        }
    }

    /// Shrinks all settle intervals; used by tests and local smoke runs.
    pub fn quick(mut self) -> Self {
        self.startup_settle = Duration::from_millis(10);
        self.discovery_settle = Duration::from_millis(10);
        self.write_settle = Duration::from_millis(10);
        self
    }
}

/// Runs every fleet phase against `capability`, recording results on
/// `reporter`. The caller owns the session and the exit code.
pub async fn run_fleet<C: BacnetCapability>(
    capability: &C,
    options: &FleetOptions,
    reporter: &mut CheckReporter,
) {
    tokio::time::sleep(options.startup_settle).await;
    let count = options.device_count.clamp(1, DEVICE_TABLE.len());
    let devices = &DEVICE_TABLE[..count];

    // Phase: Who-Is discovery with bounded retry.
    reporter.section(&format!("Who-Is Discovery (expect {count} devices)"));
    let mut sweep = DiscoveryConfig::fleet(devices.iter().map(|d| d.device_id).collect());
    sweep.settle = options.discovery_settle;
    let outcome = run_sweep(capability, &sweep).await;
    report_outcome(reporter, &outcome, count);

    // Phase: representative analogInput 0 per template type.
    reporter.section("Per-Device-Type Reads (analogInput 0)");
    let ai0 = ObjectRef::new(ObjectType::AnalogInput, 0);
    let mut seen_templates = HashSet::new();
    for spec in devices {
        let Some(template) = spec.template else {
            continue;
        };
        if !seen_templates.insert(template) {
            continue;
        }
        let ip = offset_ip(options.base_ip, spec.ip_offset);
        let (expected_name, expected_value) = template.ai0_expectation();
        println!("\n  [{template}] Device {} ({}) @ {ip}", spec.device_id, spec.name);

        checked_read(
            capability,
            reporter,
            ip,
            ai0,
            PropertyId::PresentValue,
            format!("{}: AI-0 presentValue ~ {expected_value}", spec.name),
            &Expectation::number(expected_value, REPRESENTATIVE_TOLERANCE),
        )
        .await;
        checked_read(
            capability,
            reporter,
            ip,
            ai0,
            PropertyId::ObjectName,
            format!("{}: AI-0 objectName = '{expected_name}'", spec.name),
            &Expectation::text(expected_name),
        )
        .await;
    }

    // Phase: device objectName on the first and last device.
    reporter.section("Device Object Names");
    let mut indices = vec![0];
    if count > 1 {
        indices.push(count - 1);
    }
    for idx in indices {
        let spec = &devices[idx];
        let ip = offset_ip(options.base_ip, spec.ip_offset);
        checked_read(
            capability,
            reporter,
            ip,
            ObjectRef::new(ObjectType::Device, spec.device_id),
            PropertyId::ObjectName,
            format!("Device {} objectName = '{}'", spec.device_id, spec.name),
            &Expectation::text(spec.name),
        )
        .await;
    }

    // Phase: WriteProperty then ReadProperty round-trips.
    reporter.section("Write + ReadBack");
    let ao0 = ObjectRef::new(ObjectType::AnalogOutput, 0);
    verify_write_readback(
        capability,
        reporter,
        offset_ip(options.base_ip, 0),
        "AHU-1",
        ao0,
        60.5,
        options.write_settle,
    )
    .await;
    if count >= 3 {
        verify_write_readback(
            capability,
            reporter,
            offset_ip(options.base_ip, 2),
            "VAV-101",
            ao0,
            73.0,
            options.write_settle,
        )
        .await;
    }

    // Phase: batched read on AHU-1.
    reporter.section("ReadPropertyMultiple (AHU-1 analogInput 0)");
    verify_read_multiple(
        capability,
        reporter,
        offset_ip(options.base_ip, 0),
        ai0,
        55.0,
        REPRESENTATIVE_TOLERANCE,
        "Supply Air Temp",
    )
    .await;

    // Phase: batched write on AHU-1, skipped when the stack has none.
    reporter.section("WritePropertyMultiple (AHU-1)");
    let bo0 = ObjectRef::new(ObjectType::BinaryOutput, 0);
    let batched = [WriteCheck::real(ao0, 58.5), WriteCheck::active(bo0, true)];
    verify_write_multiple(
        capability,
        reporter,
        offset_ip(options.base_ip, 0),
        "AHU-1",
        &batched,
        options.write_settle,
    )
    .await;

    // Phase: lag timing across one representative per template.
    reporter.section(&timing_section_title(options.lag_range));
    let targets = representative_targets(options.base_ip, devices);
    let stats = measure_read_latency(capability, &targets, options.timing_reads).await;
    report_latency(reporter, &stats, options.mean_read_bound);
}
