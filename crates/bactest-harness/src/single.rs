//! The single-device conformance run.
//!
//! Exercises one richly-typed device: discovery with a targeted Who-Is
//! fallback, a sweep over the flat expected-state table, a write round-trip,
//! a batched read, and the optional batched write.

use crate::capability::BacnetCapability;
use crate::discovery::{report_outcome, run_sweep, DiscoveryConfig};
use crate::object::{ObjectRef, ObjectType};
use crate::report::CheckReporter;
use crate::table::{single_device_expectations, SINGLE_DEVICE};
use crate::verify::{
    checked_read, verify_read_multiple, verify_write_multiple, verify_write_readback, WriteCheck,
    REPRESENTATIVE_TOLERANCE,
};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Knobs for a single-device run; defaults follow the conformance contract.
#[derive(Debug, Clone)]
pub struct SingleOptions {
    pub device_ip: Ipv4Addr,
    pub startup_settle: Duration,
    pub discovery_settle: Duration,
    pub write_settle: Duration,
}

impl SingleOptions {
    pub fn new(device_ip: Ipv4Addr) -> Self {
        Self {
            device_ip,
            startup_settle: Duration::from_secs(2),
            discovery_settle: Duration::from_secs(3),
            write_settle: Duration::from_secs(1),
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

/// Runs every single-device phase against `capability`.
pub async fn run_single<C: BacnetCapability>(
    capability: &C,
    options: &SingleOptions,
    reporter: &mut CheckReporter,
) {
    tokio::time::sleep(options.startup_settle).await;

    // Phase: discovery, three broadcast rounds plus one targeted Who-Is.
    reporter.section("Who-Is Discovery (expect 1 device)");
    let mut sweep = DiscoveryConfig::single(SINGLE_DEVICE.device_id, options.device_ip);
    sweep.settle = options.discovery_settle;
    let outcome = run_sweep(capability, &sweep).await;
    report_outcome(reporter, &outcome, 1);

    // Phase: every property in the expected-state table, independently.
    reporter.section("Expected Object Properties");
    for expectation in single_device_expectations() {
        let label = format!(
            "{} {} {}",
            expectation.object, expectation.property, expectation.expected
        );
        checked_read(
            capability,
            reporter,
            options.device_ip,
            expectation.object,
            expectation.property,
            label,
            &expectation.expected,
        )
        .await;
    }

    // Phase: write round-trip on the analog output.
    reporter.section("Write + ReadBack");
    let ao0 = ObjectRef::new(ObjectType::AnalogOutput, 0);
    verify_write_readback(
        capability,
        reporter,
        options.device_ip,
        SINGLE_DEVICE.name,
        ao0,
        66.5,
        options.write_settle,
    )
    .await;

    // Phase: batched read on the analog input.
    reporter.section("ReadPropertyMultiple (analogInput 0)");
    verify_read_multiple(
        capability,
        reporter,
        options.device_ip,
        ObjectRef::new(ObjectType::AnalogInput, 0),
        72.5,
        REPRESENTATIVE_TOLERANCE,
        "Zone Temp",
    )
    .await;

    // Phase: batched write, skipped when the stack has none.
    reporter.section("WritePropertyMultiple");
    let bo0 = ObjectRef::new(ObjectType::BinaryOutput, 0);
    let batched = [WriteCheck::real(ao0, 66.5), WriteCheck::active(bo0, true)];
    verify_write_multiple(
        capability,
        reporter,
        options.device_ip,
        SINGLE_DEVICE.name,
        &batched,
        options.write_settle,
    )
    .await;
}
