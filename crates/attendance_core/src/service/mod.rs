//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate reader and store calls into use-case level APIs.
//! - Keep CLI layers decoupled from storage details.

pub mod import_service;
pub mod upsert;
