//! HTTP route handlers.

pub mod admin_notifications;
pub mod admin_registrations;
pub mod admin_rooms;
pub mod admin_teams;
pub mod health;
pub mod invites;
pub mod notifications;
pub mod realtime;
pub mod registrations;
pub mod rooms;
pub mod team_notifications;
pub mod teams;
