//! Shared record types for the variant competition simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! Both the core engine and anything reading its output depend on it.

pub mod record;
pub mod variant;

// Re-export variant tags
pub use variant::{Gender, ParseTagError, Variant};

// Re-export output records
pub use record::{AgentRecord, CsvRecord, EpochRecord, RunSummary, StopReason};
