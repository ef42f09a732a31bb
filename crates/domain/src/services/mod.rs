//! Domain services.

pub mod inbox;
pub mod team_rules;

pub use inbox::NotificationInbox;
pub use team_rules::TeamError;
