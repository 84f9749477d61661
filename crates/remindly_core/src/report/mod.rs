//! Read-only reports over loaded records.
//!
//! Nothing here touches storage; callers pass the collections in.

pub mod export;
pub mod stats;
