//! In-process simulated device fleet.
//!
//! [`SimFleet`] implements [`BacnetCapability`] directly over an in-memory
//! object store: it answers discovery, serves the expected-state
//! configuration, persists writes, and can inject bounded per-request lag.
//! Useful for CI runs and for developing the harness without a simulator
//! process on the network.

use crate::capability::{BacnetCapability, PropertyReading, PropertyWrite};
use crate::error::CapabilityError;
use crate::object::{ObjectRef, ObjectType, PropertyId};
use crate::table::{offset_ip, DeviceSpec, Template, BACNET_PORT, CLIENT_DEVICE_ID};
use crate::value::Value;
use std::collections::{BTreeSet, HashMap};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Local endpoint identity for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub client_ip: Ipv4Addr,
    pub prefix_len: u8,
    pub port: u16,
    pub device_id: u32,
}

impl SessionConfig {
    pub fn new(client_ip: Ipv4Addr, prefix_len: u8) -> Self {
        Self {
            client_ip,
            prefix_len,
            port: BACNET_PORT,
            device_id: CLIENT_DEVICE_ID,
        }
    }
}

type Properties = HashMap<PropertyId, Value>;
type Objects = HashMap<ObjectRef, Properties>;

#[derive(Debug)]
struct SimDevice {
    device_id: u32,
    objects: Objects,
}

/// A fleet of simulated devices behind the capability trait.
#[derive(Debug)]
pub struct SimFleet {
    session: SessionConfig,
    devices: RwLock<HashMap<Ipv4Addr, SimDevice>>,
    discovered: RwLock<BTreeSet<u32>>,
    lag: Option<(Duration, Duration)>,
    lag_tick: AtomicU64,
}

impl SimFleet {
    /// Opens a session. The session is released when the fleet is dropped,
    /// on every exit path.
    pub fn open(session: SessionConfig) -> Self {
        log::debug!(
            "sim session open on {}/{} port {} as device {}",
            session.client_ip,
            session.prefix_len,
            session.port,
            session.device_id
        );
        Self {
            session,
            devices: RwLock::new(HashMap::new()),
            discovered: RwLock::new(BTreeSet::new()),
            lag: None,
            lag_tick: AtomicU64::new(0),
        }
    }

    /// Populates one device per spec at `base_ip + ip_offset`.
    pub fn with_devices(mut self, base_ip: Ipv4Addr, specs: &[DeviceSpec]) -> Self {
        let devices = self.devices.get_mut();
        for spec in specs {
            devices.insert(
                offset_ip(base_ip, spec.ip_offset),
                SimDevice {
                    device_id: spec.device_id,
                    objects: device_objects(spec),
                },
            );
        }
        self
    }

    /// Injects a bounded per-request delay with deterministic jitter.
    pub fn with_lag(mut self, min: Duration, max: Duration) -> Self {
        self.lag = Some((min, max.max(min)));
        self
    }

    async fn induce_lag(&self) {
        let Some((min, max)) = self.lag else {
            return;
        };
        let span = max.saturating_sub(min);
        let jitter = if span.is_zero() {
            Duration::ZERO
        } else {
            // Multiplicative hash of a counter; spreads reads across the range
            // without pulling in a randomness dependency.
            let tick = self.lag_tick.fetch_add(1, Ordering::Relaxed);
            let frac = (tick.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 32) % 1000;
            span.mul_f64(frac as f64 / 1000.0)
        };
        tokio::time::sleep(min + jitter).await;
    }
}

impl Drop for SimFleet {
    fn drop(&mut self) {
        log::debug!("sim session for device {} closed", self.session.device_id);
    }
}

fn properties(name: &str, present_value: Value) -> Properties {
    HashMap::from([
        (PropertyId::ObjectName, Value::text(name)),
        (PropertyId::PresentValue, present_value),
    ])
}

/// Builds the object database for one device spec: its device object plus
/// the objects its template is contracted to present.
fn device_objects(spec: &DeviceSpec) -> Objects {
    let mut objects = Objects::new();
    objects.insert(
        ObjectRef::new(ObjectType::Device, spec.device_id),
        HashMap::from([(PropertyId::ObjectName, Value::text(spec.name))]),
    );

    match spec.template {
        Some(template) => {
            let (ai_name, ai_value) = template.ai0_expectation();
            objects.insert(
                ObjectRef::new(ObjectType::AnalogInput, 0),
                properties(ai_name, Value::Real(ai_value)),
            );
            if let Some((ao_name, ao_value, bo_name)) = template_outputs(template) {
                objects.insert(
                    ObjectRef::new(ObjectType::AnalogOutput, 0),
                    properties(ao_name, Value::Real(ao_value)),
                );
                objects.insert(
                    ObjectRef::new(ObjectType::BinaryOutput, 0),
                    properties(bo_name, Value::Bool(false)),
                );
            }
        }
        None => {
            objects.insert(
                ObjectRef::new(ObjectType::AnalogInput, 0),
                properties("Zone Temp", Value::Real(72.5)),
            );
            objects.insert(
                ObjectRef::new(ObjectType::AnalogOutput, 0),
                properties("Cooling Setpoint", Value::Real(68.0)),
            );
            objects.insert(
                ObjectRef::new(ObjectType::BinaryInput, 0),
                properties("Occupancy Sensor", Value::Bool(true)),
            );
            objects.insert(
                ObjectRef::new(ObjectType::BinaryOutput, 0),
                properties("Fan Command", Value::Bool(false)),
            );
            objects.insert(
                ObjectRef::new(ObjectType::MultiStateValue, 0),
                properties("System Mode", Value::Unsigned(2)),
            );
            objects.insert(
                ObjectRef::new(ObjectType::CharacterStringValue, 0),
                properties("Occupancy State", Value::text("Occupied")),
            );
        }
    }
    objects
}

/// Writable outputs per template; meters expose none.
fn template_outputs(template: Template) -> Option<(&'static str, f64, &'static str)> {
    match template {
        Template::Ahu => Some(("Supply Air Temp Setpoint", 55.0, "Supply Fan Command")),
        Template::Vav => Some(("Cooling Setpoint", 74.0, "Reheat Command")),
        Template::Boiler => Some(("Supply Water Setpoint", 180.0, "Pump Command")),
        Template::Meter => None,
    }
}

impl BacnetCapability for SimFleet {
    async fn discover(&self) -> Result<(), CapabilityError> {
        self.induce_lag().await;
        let devices = self.devices.read().await;
        let mut discovered = self.discovered.write().await;
        for device in devices.values() {
            discovered.insert(device.device_id);
        }
        Ok(())
    }

    async fn who_is(&self, target: Option<Ipv4Addr>) -> Result<(), CapabilityError> {
        self.induce_lag().await;
        let devices = self.devices.read().await;
        let mut discovered = self.discovered.write().await;
        match target {
            None => {
                for device in devices.values() {
                    discovered.insert(device.device_id);
                }
            }
            Some(ip) => {
                if let Some(device) = devices.get(&ip) {
                    discovered.insert(device.device_id);
                }
            }
        }
        Ok(())
    }

    async fn discovered_devices(&self) -> Vec<u32> {
        self.discovered.read().await.iter().copied().collect()
    }

    async fn read(
        &self,
        addr: Ipv4Addr,
        object: ObjectRef,
        property: PropertyId,
    ) -> Result<Value, CapabilityError> {
        self.induce_lag().await;
        let devices = self.devices.read().await;
        let device = devices
            .get(&addr)
            .ok_or(CapabilityError::Unreachable(addr))?;
        let props = device
            .objects
            .get(&object)
            .ok_or(CapabilityError::UnknownObject(object))?;
        props
            .get(&property)
            .cloned()
            .ok_or(CapabilityError::UnknownProperty { object, property })
    }

    async fn read_multiple(
        &self,
        addr: Ipv4Addr,
        object: ObjectRef,
        properties: &[PropertyId],
    ) -> Result<Vec<PropertyReading>, CapabilityError> {
        self.induce_lag().await;
        let devices = self.devices.read().await;
        let device = devices
            .get(&addr)
            .ok_or(CapabilityError::Unreachable(addr))?;
        let props = device
            .objects
            .get(&object)
            .ok_or(CapabilityError::UnknownObject(object))?;
        Ok(properties
            .iter()
            .filter_map(|&property| {
                props
                    .get(&property)
                    .map(|value| PropertyReading::tagged(property, value.clone()))
            })
            .collect())
    }

    async fn write(
        &self,
        addr: Ipv4Addr,
        object: ObjectRef,
        property: PropertyId,
        value: Value,
        _priority: u8,
    ) -> Result<(), CapabilityError> {
        self.induce_lag().await;
        let mut devices = self.devices.write().await;
        let device = devices
            .get_mut(&addr)
            .ok_or(CapabilityError::Unreachable(addr))?;
        let props = device
            .objects
            .get_mut(&object)
            .ok_or(CapabilityError::UnknownObject(object))?;
        // Priority arrays are not modelled; last write wins.
        props.insert(property, value);
        Ok(())
    }

    async fn write_multiple(
        &self,
        addr: Ipv4Addr,
        writes: &[PropertyWrite],
    ) -> Result<(), CapabilityError> {
        self.induce_lag().await;
        let mut devices = self.devices.write().await;
        let device = devices
            .get_mut(&addr)
            .ok_or(CapabilityError::Unreachable(addr))?;
        for write in writes {
            let props = device
                .objects
                .get_mut(&write.object)
                .ok_or(CapabilityError::UnknownObject(write.object))?;
            props.insert(write.property, write.value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{DEVICE_TABLE, SINGLE_DEVICE};

    fn base_ip() -> Ipv4Addr {
        "172.20.0.10".parse().unwrap()
    }

    fn fleet() -> SimFleet {
        SimFleet::open(SessionConfig::new("172.20.0.100".parse().unwrap(), 24))
            .with_devices(base_ip(), &DEVICE_TABLE)
    }

    #[tokio::test]
    async fn discovery_is_empty_until_queried() {
        let sim = fleet();
        assert!(sim.discovered_devices().await.is_empty());
        sim.discover().await.unwrap();
        assert_eq!(sim.discovered_devices().await.len(), DEVICE_TABLE.len());
    }

    #[tokio::test]
    async fn targeted_who_is_discovers_one_device() {
        let sim = fleet();
        sim.who_is(Some(offset_ip(base_ip(), 2))).await.unwrap();
        assert_eq!(sim.discovered_devices().await, vec![2001]);
    }

    #[tokio::test]
    async fn reads_serve_the_template_configuration() {
        let sim = fleet();
        let boiler_ip = offset_ip(base_ip(), 6);
        let ai0 = ObjectRef::new(ObjectType::AnalogInput, 0);
        assert_eq!(
            sim.read(boiler_ip, ai0, PropertyId::PresentValue)
                .await
                .unwrap(),
            Value::Real(160.0)
        );
        assert_eq!(
            sim.read(boiler_ip, ai0, PropertyId::ObjectName)
                .await
                .unwrap(),
            Value::text("Supply Water Temp")
        );
    }

    #[tokio::test]
    async fn writes_persist_until_read_back() {
        let sim = fleet();
        let ahu_ip = offset_ip(base_ip(), 0);
        let ao0 = ObjectRef::new(ObjectType::AnalogOutput, 0);
        sim.write(ahu_ip, ao0, PropertyId::PresentValue, Value::Real(60.5), 8)
            .await
            .unwrap();
        assert_eq!(
            sim.read(ahu_ip, ao0, PropertyId::PresentValue)
                .await
                .unwrap(),
            Value::Real(60.5)
        );
    }

    #[tokio::test]
    async fn unknown_targets_error_instead_of_answering() {
        let sim = fleet();
        let nowhere: Ipv4Addr = "172.20.0.99".parse().unwrap();
        let ai0 = ObjectRef::new(ObjectType::AnalogInput, 0);
        assert!(matches!(
            sim.read(nowhere, ai0, PropertyId::PresentValue).await,
            Err(CapabilityError::Unreachable(_))
        ));

        let meter_ip = offset_ip(base_ip(), 7);
        let ao0 = ObjectRef::new(ObjectType::AnalogOutput, 0);
        assert!(matches!(
            sim.read(meter_ip, ao0, PropertyId::PresentValue).await,
            Err(CapabilityError::UnknownObject(_))
        ));
    }

    #[tokio::test]
    async fn single_device_store_matches_the_expected_state_table() {
        let device_ip = base_ip();
        let sim = SimFleet::open(SessionConfig::new("172.20.0.100".parse().unwrap(), 24))
            .with_devices(device_ip, &[SINGLE_DEVICE]);
        for expectation in crate::table::single_device_expectations() {
            let value = sim
                .read(device_ip, expectation.object, expectation.property)
                .await
                .unwrap();
            assert!(
                expectation.expected.matches(&value),
                "{} {} served {value:?}",
                expectation.object,
                expectation.property
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn lag_delays_every_request() {
        let sim = fleet().with_lag(Duration::from_millis(2), Duration::from_millis(10));
        let started = tokio::time::Instant::now();
        sim.read(
            offset_ip(base_ip(), 0),
            ObjectRef::new(ObjectType::AnalogInput, 0),
            PropertyId::PresentValue,
        )
        .await
        .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(2));
    }
}
