//! Delivery adapters: calendar events over HTTP and email over SMTP.

pub mod calendar;
pub mod email;
pub mod templates;
