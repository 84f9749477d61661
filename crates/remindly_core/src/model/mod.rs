//! Domain model for tasks and reminders.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep the persisted recurrence blob behind a tagged variant.
//!
//! # Invariants
//! - Every record is identified by a stable UUID and scoped to one owner.
//! - Series membership is expressed only through `Reminder::original_id`.

pub mod common;
pub mod recurrence;
pub mod reminder;
pub mod task;
