use crate::object::ObjectRef;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors surfaced by a [`BacnetCapability`](crate::BacnetCapability) backend.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request timed out")]
    Timeout,
    #[error("no device responding at {0}")]
    Unreachable(Ipv4Addr),
    #[error("unknown object {0}")]
    UnknownObject(ObjectRef),
    #[error("unknown property {property} of {object}")]
    UnknownProperty {
        object: ObjectRef,
        property: crate::object::PropertyId,
    },
    #[error("{0} is not supported by this capability")]
    Unsupported(&'static str),
    #[error("remote error: {0}")]
    Remote(String),
}
