//! Minimal BACnet object addressing used by the harness.
//!
//! Only the object kinds the simulator fleet is contracted to present are
//! modelled here; the wire-level object identifier encoding belongs to the
//! capability backend.

use std::fmt;

/// BACnet object kinds exercised by the conformance checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    AnalogInput,
    AnalogOutput,
    BinaryInput,
    BinaryOutput,
    MultiStateValue,
    CharacterStringValue,
    Device,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AnalogInput => "analogInput",
            Self::AnalogOutput => "analogOutput",
            Self::BinaryInput => "binaryInput",
            Self::BinaryOutput => "binaryOutput",
            Self::MultiStateValue => "multiStateValue",
            Self::CharacterStringValue => "characterstringValue",
            Self::Device => "device",
        };
        f.write_str(name)
    }
}

/// Properties the harness reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    PresentValue,
    ObjectName,
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PresentValue => "presentValue",
            Self::ObjectName => "objectName",
        };
        f.write_str(name)
    }
}

/// An object on a device, addressed by type and instance number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub object_type: ObjectType,
    pub instance: u32,
}

impl ObjectRef {
    pub const fn new(object_type: ObjectType, instance: u32) -> Self {
        Self {
            object_type,
            instance,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.object_type, self.instance)
    }
}
