//! Domain layer for the Hackathon Hub backend.
//!
//! This crate contains:
//! - Domain models (Registration, Team, TeamInvite, Room, Notification)
//! - Business rules (team/invite state machine, room placement, client inbox)
//! - Domain error types

pub mod models;
pub mod services;
