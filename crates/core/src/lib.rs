//! Domain logic for mentor interview scheduling.
//!
//! This crate has zero internal dependencies so it can be shared by the
//! repository layer, the scheduling services and the HTTP layer alike.
//! Everything here is either pure logic or a capability trait; I/O lives in
//! the `db`, `events` and `scheduling` crates.

pub mod calendar;
pub mod clock;
pub mod error;
pub mod idempotency;
pub mod interview;
pub mod notify;
pub mod reconcile;
pub mod reminders;
pub mod roles;
pub mod slots;
pub mod status;
pub mod types;
