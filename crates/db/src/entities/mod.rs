//! Database entities.

pub mod announcement;
pub mod center;
pub mod complaint;
pub mod complaint_timeline;
pub mod feedback;
pub mod meeting;
pub mod message;
pub mod profile;
pub mod user_role;

pub use announcement::Entity as Announcement;
pub use center::Entity as Center;
pub use complaint::Entity as Complaint;
pub use complaint_timeline::Entity as ComplaintTimeline;
pub use feedback::Entity as Feedback;
pub use meeting::Entity as Meeting;
pub use message::Entity as Message;
pub use profile::Entity as Profile;
pub use user_role::Entity as UserRole;
