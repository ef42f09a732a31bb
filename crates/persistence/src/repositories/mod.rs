//! Repository implementations for database operations.

pub mod invite;
pub mod notification;
pub mod profile;
pub mod registration;
pub mod system_config;
pub mod team;
pub mod user_notification;

pub use invite::{AcceptOutcome, InviteRepository};
pub use notification::NotificationRepository;
pub use profile::ProfileRepository;
pub use registration::RegistrationRepository;
pub use system_config::SystemConfigRepository;
pub use team::{DeletedTeam, PlacementMode, PlacementOutcome, TeamRepository};
pub use user_notification::UserNotificationRepository;
