//! Shared building blocks for the verification phases.
//!
//! Every helper here contains capability errors at the smallest enclosing
//! check: a read or write that fails becomes one failed [`CheckResult`]
//! carrying the error text, and the run continues with the next check.

use crate::capability::{BacnetCapability, PropertyWrite, DEFAULT_WRITE_PRIORITY};
use crate::error::CapabilityError;
use crate::object::{ObjectRef, PropertyId};
use crate::report::CheckReporter;
use crate::value::{Expectation, Value};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Tolerance for read-backs and per-property expected values.
pub const EXACT_TOLERANCE: f64 = 0.1;
/// Looser tolerance for representative cross-type reads.
pub const REPRESENTATIVE_TOLERANCE: f64 = 0.5;

/// Reads one property and records one check against `expectation`.
pub async fn checked_read<C: BacnetCapability>(
    capability: &C,
    reporter: &mut CheckReporter,
    addr: Ipv4Addr,
    object: ObjectRef,
    property: PropertyId,
    label: impl Into<String>,
    expectation: &Expectation,
) {
    match capability.read(addr, object, property).await {
        Ok(value) => {
            reporter.check(label, expectation.matches(&value), format!("got {value}"));
        }
        Err(err) => {
            reporter.check(label, false, err.to_string());
        }
    }
}

/// Writes a present-value, waits for the device to settle, and reads it back.
pub async fn verify_write_readback<C: BacnetCapability>(
    capability: &C,
    reporter: &mut CheckReporter,
    addr: Ipv4Addr,
    device_name: &str,
    object: ObjectRef,
    value: f64,
    settle: Duration,
) {
    println!("\n  {device_name} @ {addr}: write {object} = {value}");
    let result: Result<Value, CapabilityError> = async {
        capability
            .write(
                addr,
                object,
                PropertyId::PresentValue,
                Value::Real(value),
                DEFAULT_WRITE_PRIORITY,
            )
            .await?;
        tokio::time::sleep(settle).await;
        capability.read(addr, object, PropertyId::PresentValue).await
    }
    .await;

    match result {
        Ok(read_back) => {
            let within = read_back
                .as_f64()
                .is_some_and(|got| (got - value).abs() < EXACT_TOLERANCE);
            reporter.check(
                format!("{device_name}: write {value} -> read-back"),
                within,
                format!("got {read_back}"),
            );
        }
        Err(err) => {
            reporter.check(
                format!("{device_name}: write {object}"),
                false,
                err.to_string(),
            );
        }
    }
}

/// Batch-reads presentValue and objectName from one object and records the
/// three standard ReadPropertyMultiple checks.
///
/// Readings may or may not carry property tags depending on the backend, so
/// matching scans the returned values rather than trusting the tags.
pub async fn verify_read_multiple<C: BacnetCapability>(
    capability: &C,
    reporter: &mut CheckReporter,
    addr: Ipv4Addr,
    object: ObjectRef,
    expected_value: f64,
    value_tolerance: f64,
    expected_name: &str,
) {
    let properties = [PropertyId::PresentValue, PropertyId::ObjectName];
    match capability.read_multiple(addr, object, &properties).await {
        Ok(readings) => {
            println!("  readMultiple result: {readings:?}");
            reporter.check(
                "RPM returned data",
                !readings.is_empty(),
                format!("got {readings:?}"),
            );
            let pv_found = readings
                .iter()
                .filter_map(|r| r.value.as_f64())
                .any(|v| (v - expected_value).abs() < value_tolerance);
            let name_found = readings
                .iter()
                .any(|r| matches!(&r.value, Value::Text(s) if s.contains(expected_name)));
            reporter.check(
                format!("RPM contains presentValue ~{expected_value}"),
                pv_found,
                format!("readings={readings:?}"),
            );
            reporter.check(
                format!("RPM contains objectName '{expected_name}'"),
                name_found,
                format!("readings={readings:?}"),
            );
        }
        Err(err) => {
            reporter.check("ReadPropertyMultiple", false, err.to_string());
        }
    }
}

/// A batched write together with the expectation its read-back must satisfy.
#[derive(Debug, Clone)]
pub struct WriteCheck {
    pub write: PropertyWrite,
    pub read_back: Expectation,
}

impl WriteCheck {
    pub fn real(object: ObjectRef, value: f64) -> Self {
        Self {
            write: PropertyWrite {
                object,
                property: PropertyId::PresentValue,
                value: Value::Real(value),
            },
            read_back: Expectation::number(value, EXACT_TOLERANCE),
        }
    }

    pub fn active(object: ObjectRef, state: bool) -> Self {
        Self {
            write: PropertyWrite {
                object,
                property: PropertyId::PresentValue,
                value: Value::Bool(state),
            },
            read_back: Expectation::Active(state),
        }
    }
}

/// Issues a batched write and verifies each element read back, or records a
/// skip when the capability exposes no batched write at all.
pub async fn verify_write_multiple<C: BacnetCapability>(
    capability: &C,
    reporter: &mut CheckReporter,
    addr: Ipv4Addr,
    device_name: &str,
    checks: &[WriteCheck],
    settle: Duration,
) {
    let writes: Vec<PropertyWrite> = checks.iter().map(|c| c.write.clone()).collect();
    match capability.write_multiple(addr, &writes).await {
        Err(CapabilityError::Unsupported(_)) => {
            reporter.skip(
                format!("{device_name}: WritePropertyMultiple round-trip"),
                "capability exposes no batched write operation",
            );
        }
        Err(err) => {
            reporter.check(
                format!("{device_name}: WritePropertyMultiple round-trip"),
                false,
                err.to_string(),
            );
        }
        Ok(()) => {
            tokio::time::sleep(settle).await;
            for check in checks {
                let label = format!(
                    "{device_name}: WPM {} {} {}",
                    check.write.object, check.write.property, check.read_back
                );
                checked_read(
                    capability,
                    reporter,
                    addr,
                    check.write.object,
                    check.write.property,
                    label,
                    &check.read_back,
                )
                .await;
            }
        }
    }
}
