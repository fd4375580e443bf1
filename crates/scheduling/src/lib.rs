//! Scheduling services: slot reconciliation, mentor assignment, self-service
//! booking and reminder delivery.
//!
//! Each service owns a database pool plus the gateway capabilities it needs.
//! Authoritative state changes happen inside one database transaction;
//! calendar and notification calls happen before or after it and only ever
//! degrade the result, never fail it.

pub mod booking;
pub mod enrichment;
pub mod error;
pub mod reconciler;
pub mod reminder;
pub mod selection;
pub mod settings;

pub use booking::{AssignmentOutcome, BookingOrchestrator, SelfServiceBooking};
pub use error::SchedulingError;
pub use reconciler::{ReconcileOutcome, SlotReconciler};
pub use reminder::{PollReport, ReminderScheduler};
pub use selection::{MentorSelectionPolicy, OldestActiveMentor};
pub use settings::{ReminderSettings, SchedulingSettings};
