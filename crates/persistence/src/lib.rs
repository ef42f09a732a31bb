//! Persistence layer for the hackathon hub backend.
//!
//! This crate contains:
//! - Database connection management
//! - Query timing metrics
//! - Entity definitions (database row mappings)
//! - Repository implementations

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
