//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Host the reminder lifecycle controller.
//! - Keep CLI/UI layers decoupled from storage details.

pub mod filter;
pub mod reminder_service;
pub mod task_service;
