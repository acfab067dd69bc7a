//! Static expected-state tables describing the simulator fleet under test.
//!
//! These tables are the contract the simulator is checked against: device
//! identities, addresses derived from a base IP, and the property values each
//! behavioral template is configured to report. They are data, not logic;
//! consumers validate them by reading the devices they describe.

use crate::object::{ObjectRef, ObjectType, PropertyId};
use crate::value::Expectation;
use std::fmt;
use std::net::Ipv4Addr;

/// UDP port all simulator devices listen on.
pub const BACNET_PORT: u16 = 47808;

/// Device id the harness claims for itself; must differ from every simulator id.
pub const CLIENT_DEVICE_ID: u32 = 999;

/// Behavioral template a fleet device is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Ahu,
    Vav,
    Boiler,
    Meter,
}

impl Template {
    /// Expected object name and present-value of the first analog input on a
    /// device of this template.
    pub fn ai0_expectation(self) -> (&'static str, f64) {
        match self {
            Self::Ahu => ("Supply Air Temp", 55.0),
            Self::Vav => ("Zone Temp", 72.0),
            Self::Boiler => ("Supply Water Temp", 160.0),
            Self::Meter => ("Power", 125.0),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ahu => "ahu",
            Self::Vav => "vav",
            Self::Boiler => "boiler",
            Self::Meter => "meter",
        };
        f.write_str(name)
    }
}

/// Identity and addressing of one device under test.
///
/// `ip_offset` is added to the last octet of the base address to derive the
/// device's concrete address; offsets in the table are chosen not to collide
/// or leave octet range, which is why [`offset_ip`] does not re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpec {
    pub device_id: u32,
    pub name: &'static str,
    pub template: Option<Template>,
    pub ip_offset: u8,
}

const fn fleet(device_id: u32, name: &'static str, template: Template, ip_offset: u8) -> DeviceSpec {
    DeviceSpec {
        device_id,
        name,
        template: Some(template),
        ip_offset,
    }
}

/// The 9-device fleet, in discovery order. `--device-count n` exercises the
/// first `n` entries.
pub const DEVICE_TABLE: [DeviceSpec; 9] = [
    fleet(1001, "AHU-1", Template::Ahu, 0),
    fleet(1002, "AHU-2", Template::Ahu, 1),
    fleet(2001, "VAV-101", Template::Vav, 2),
    fleet(2002, "VAV-102", Template::Vav, 3),
    fleet(2003, "VAV-201", Template::Vav, 4),
    fleet(2004, "VAV-202", Template::Vav, 5),
    fleet(3001, "Boiler-1", Template::Boiler, 6),
    fleet(4001, "Elec Meter Main", Template::Meter, 7),
    fleet(4002, "Elec Meter Floor2", Template::Meter, 8),
];

/// Derives a device address by adding `offset` to the last octet of `base`.
///
/// Only the last octet changes. The caller guarantees the sum stays in octet
/// range; the static tables are laid out so it always does.
pub fn offset_ip(base: Ipv4Addr, offset: u8) -> Ipv4Addr {
    let mut octets = base.octets();
    octets[3] = octets[3].wrapping_add(offset);
    Ipv4Addr::from(octets)
}

/// The single richly-typed device exercised by the single-device variant.
pub const SINGLE_DEVICE: DeviceSpec = DeviceSpec {
    device_id: 500,
    name: "Sim-Device-500",
    template: None,
    ip_offset: 0,
};

/// One expected property of the single device.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyExpectation {
    pub object: ObjectRef,
    pub property: PropertyId,
    pub expected: Expectation,
}

/// Flat expected-state table for the single-device variant: one object of
/// each kind the simulator presents, checked property by property.
pub fn single_device_expectations() -> Vec<PropertyExpectation> {
    use ObjectType::*;
    use PropertyId::*;

    let expect = |object_type, instance, property, expected| PropertyExpectation {
        object: ObjectRef::new(object_type, instance),
        property,
        expected,
    };

    vec![
        expect(AnalogInput, 0, PresentValue, Expectation::number(72.5, 0.1)),
        expect(AnalogInput, 0, ObjectName, Expectation::text("Zone Temp")),
        expect(AnalogOutput, 0, PresentValue, Expectation::number(68.0, 0.1)),
        expect(AnalogOutput, 0, ObjectName, Expectation::text("Cooling Setpoint")),
        expect(BinaryInput, 0, PresentValue, Expectation::Active(true)),
        expect(BinaryOutput, 0, PresentValue, Expectation::Active(false)),
        expect(MultiStateValue, 0, PresentValue, Expectation::number(2.0, 0.1)),
        expect(
            CharacterStringValue,
            0,
            PresentValue,
            Expectation::text("Occupied"),
        ),
        expect(
            Device,
            SINGLE_DEVICE.device_id,
            ObjectName,
            Expectation::text(SINGLE_DEVICE.name),
        ),
    ]
}
