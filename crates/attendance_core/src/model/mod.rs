//! Domain model shared by the reader, the upsert protocol and storage.
//!
//! # Responsibility
//! - Define the value objects produced by import and consumed by storage.
//!
//! # Invariants
//! - `Attendee::user_id` is the only persistence identity for attendees.
//! - `Event::id` is the only persistence identity for events; an empty id
//!   means the event has not been stored yet.
//! - Entities are never mutated after construction.

pub mod attendance;
pub mod attendee;
pub mod event;
