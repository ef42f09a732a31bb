//! Domain models for Hackathon Hub.

pub mod invite;
pub mod notification;
pub mod profile;
pub mod realtime;
pub mod registration;
pub mod room;
pub mod system_config;
pub mod team;

pub use invite::TeamInvite;
pub use notification::{Notification, NotificationScope, NotificationView, UserNotification};
pub use profile::Profile;
pub use registration::Registration;
pub use room::{Room, RoomError};
pub use team::{MembershipStatus, Team, TeamMember};
