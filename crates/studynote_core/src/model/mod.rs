//! Record model for notes and timetable entries.
//!
//! # Responsibility
//! - Define the two record kinds and the contract the stores rely on.
//! - Keep wire/storage shapes stable across remote and local persistence.
//!
//! # Invariants
//! - Every record is identified by a store-generated `RecordId`.
//! - Deletion is a hard removal; identifiers are never handed out again.

pub mod note;
pub mod preview;
pub mod record;
pub mod timetable;
