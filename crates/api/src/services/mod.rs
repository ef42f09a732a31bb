//! In-process services shared by route handlers.

pub mod realtime;

pub use realtime::{HubEvent, RealtimeHub};
