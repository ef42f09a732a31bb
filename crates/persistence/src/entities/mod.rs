//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod invite;
pub mod notification;
pub mod profile;
pub mod registration;
pub mod system_config;
pub mod team;

pub use invite::{ReceivedInviteEntity, TeamInviteEntity};
pub use notification::{GlobalFeedEntity, NotificationEntity, UserNotificationEntity};
pub use profile::ProfileEntity;
pub use registration::RegistrationEntity;
pub use system_config::SystemConfigEntity;
pub use team::{
    BoardTeamEntity, MembershipStatusDb, RoomOccupancyEntity, TeamEntity, TeamMemberEntity,
    TeamMemberWithProfileEntity,
};
