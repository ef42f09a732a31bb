//! Shared utilities and common types for the Hackathon Hub backend.
//!
//! This crate provides functionality used across all other crates:
//! - Session token verification
//! - Common validation and normalization helpers

pub mod jwt;
pub mod validation;
