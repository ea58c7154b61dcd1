// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herald-core: value types shared by every part of the event bus
//!
//! This crate provides:
//! - `EventMessage` - one immutable occurrence record and its wire form
//! - `SubscriptionSet` - the (name, level) predicate a destination filters on
//! - `DestinationRecord` - the serialized identity of a destination
//! - Id and clock abstractions so tests can pin both

pub mod clock;
pub mod destination;
pub mod id;
pub mod message;
pub mod subscription;

pub use clock::{Clock, FakeClock, SystemClock};
pub use destination::{
    Credentials, DestinationOptions, DestinationRecord, PersistedDestination, ABSTRACT_DESTINATION_TYPE,
    DEFAULT_DESTINATION_LABEL,
};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use message::{
    EventLevel, EventMessage, EventMessageRecord, MessageError, MessageKind, Payload,
};
pub use subscription::{EventPattern, SubscriptionSet, SubscriptionSetOptions, WILDCARD};
