//! Conformance harness for BACnet/IP device simulators.
//!
//! `bactest-harness` sequences discovery, property read/write, batched
//! read/write, and latency checks against a fleet of simulated BACnet
//! devices, comparing every response to a static expected-state table. The
//! protocol itself lives behind the [`BacnetCapability`] trait; the harness
//! contributes the orchestration, the expected-state model, and the pass/fail
//! bookkeeping.
//!
//! Two run variants exist, mirroring the simulator deployments under test:
//! [`fleet::run_fleet`] for the 9-device fleet and [`single::run_single`]
//! for one richly-typed device.

#![allow(async_fn_in_trait)]

pub mod capability;
pub mod discovery;
pub mod error;
pub mod fleet;
pub mod object;
pub mod report;
pub mod sim;
pub mod single;
pub mod table;
pub mod timing;
pub mod verify;
pub mod value;

pub use capability::{BacnetCapability, PropertyReading, PropertyWrite, DEFAULT_WRITE_PRIORITY};
pub use error::CapabilityError;
pub use fleet::{run_fleet, FleetOptions};
pub use object::{ObjectRef, ObjectType, PropertyId};
pub use report::{CheckReporter, CheckResult, RunReport, RunSummary, SkippedCheck};
pub use sim::{SessionConfig, SimFleet};
pub use single::{run_single, SingleOptions};
pub use table::{
    offset_ip, DeviceSpec, Template, BACNET_PORT, CLIENT_DEVICE_ID, DEVICE_TABLE, SINGLE_DEVICE,
};
pub use value::{Expectation, Value};
