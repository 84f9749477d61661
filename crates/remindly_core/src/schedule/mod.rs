//! Recurrence engine and time-driven reminder machinery.
//!
//! # Responsibility
//! - `engine`: pure due-state predicates and successor derivation.
//! - `timers`: cancellable one-shot notifications armed at creation.
//! - `due_check`: the periodic background pass owned by an explicit handle.

pub mod due_check;
pub mod engine;
pub mod timers;
