//! Long-running tasks spawned by the server binary.

pub mod reminders;
