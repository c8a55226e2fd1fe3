//! Database repositories.

pub mod announcement;
pub mod center;
pub mod complaint;
pub mod feedback;
pub mod meeting;
pub mod message;
pub mod profile;
pub mod timeline;
pub mod user_role;

pub use announcement::AnnouncementRepository;
pub use center::CenterRepository;
pub use complaint::{ComplaintFilter, ComplaintRepository, LockedUpdate};
pub use feedback::FeedbackRepository;
pub use meeting::MeetingRepository;
pub use message::MessageRepository;
pub use profile::ProfileRepository;
pub use timeline::TimelineRepository;
pub use user_role::UserRoleRepository;

/// Case-insensitive substring pattern for `LIKE`. Wildcards typed by the
/// user match literally.
pub(crate) fn contains_pattern(query: &str) -> String {
    let escaped = query
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
