//! The boundary between the conformance harness and a BACnet/IP client stack.
//!
//! Everything protocol-shaped lives behind [`BacnetCapability`]: issuing
//! Who-Is, reading and writing properties, and batched variants of both. The
//! harness only sequences these calls and compares results, so any stack that
//! can answer them — the in-process [`SimFleet`](crate::sim::SimFleet) or a
//! real BACnet/IP client — plugs in here.

use crate::error::CapabilityError;
use crate::object::{ObjectRef, PropertyId};
use crate::value::Value;
use std::net::Ipv4Addr;

/// Default BACnet write priority used for all conformance writes.
pub const DEFAULT_WRITE_PRIORITY: u8 = 8;

/// One element of a batched-read response, normalized at the boundary.
///
/// Stacks differ in whether they tag batched results with the property they
/// answer; `property` is `None` when the backend could not say.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyReading {
    pub property: Option<PropertyId>,
    pub value: Value,
}

impl PropertyReading {
    pub fn tagged(property: PropertyId, value: Value) -> Self {
        Self {
            property: Some(property),
            value,
        }
    }
}

/// One element of a batched-write request.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyWrite {
    pub object: ObjectRef,
    pub property: PropertyId,
    pub value: Value,
}

/// Async operations the harness requires from a BACnet/IP client.
///
/// All calls are issued sequentially; implementations never see overlapping
/// requests from the harness. Discovery results accumulate on the session and
/// are reported as exact device identifiers, never as display strings.
pub trait BacnetCapability: Send + Sync {
    /// Broadcasts the stack's preferred discovery query (global Who-Is).
    async fn discover(&self) -> Result<(), CapabilityError>;

    /// Issues a lower-level Who-Is, optionally directed at one address.
    async fn who_is(&self, target: Option<Ipv4Addr>) -> Result<(), CapabilityError>;

    /// Device identifiers that have answered a discovery query so far.
    async fn discovered_devices(&self) -> Vec<u32>;

    /// Reads a single property.
    async fn read(
        &self,
        addr: Ipv4Addr,
        object: ObjectRef,
        property: PropertyId,
    ) -> Result<Value, CapabilityError>;

    /// Reads several properties of one object in a single request.
    async fn read_multiple(
        &self,
        addr: Ipv4Addr,
        object: ObjectRef,
        properties: &[PropertyId],
    ) -> Result<Vec<PropertyReading>, CapabilityError>;

    /// Writes a single property at the given priority.
    async fn write(
        &self,
        addr: Ipv4Addr,
        object: ObjectRef,
        property: PropertyId,
        value: Value,
        priority: u8,
    ) -> Result<(), CapabilityError>;

    /// Writes several properties in a single request.
    ///
    /// Optional: stacks without WritePropertyMultiple keep this default, and
    /// the corresponding conformance check is skipped rather than failed.
    async fn write_multiple(
        &self,
        _addr: Ipv4Addr,
        _writes: &[PropertyWrite],
    ) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unsupported("WritePropertyMultiple"))
    }
}
