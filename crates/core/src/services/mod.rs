//! Business logic services.

#![allow(missing_docs)]

pub mod analytics;
pub mod announcement;
pub mod badge;
pub mod center;
pub mod change_bus;
pub mod complaint;
pub mod event_publisher;
pub mod feedback;
pub mod meeting;
pub mod messaging;
pub mod profile;
pub mod timeline;

pub use analytics::{AnalyticsService, DashboardStats, DayCount, NamedCount, Overview};
pub use announcement::{AnnouncementService, CreateAnnouncementInput, UpdateAnnouncementInput};
pub use badge::{BadgeCounts, BadgeService};
pub use center::CenterService;
pub use change_bus::{ChangeBus, ChangeFilter, Subscription};
pub use complaint::{
    ComplaintChanges, ComplaintService, ComplaintUpdate, ComplaintView, CreateComplaintInput,
    PersonSummary,
};
pub use event_publisher::{
    ChangeEvent, ChangeKind, EventPublisher, EventPublisherService, NoOpEventPublisher,
};
pub use feedback::{FeedbackService, FeedbackView, SubmitFeedbackInput};
pub use meeting::{MeetingService, RequestMeetingInput, UpdateMeetingInput};
pub use messaging::{MessageItem, MessagingService, SendMessageInput};
pub use profile::{
    IdentityClaims, ProfileService, UpdateProfileInput, UpdateUserInput, UserStats, UserWithRole,
};
pub use timeline::{EntryValues, TimelineItem, TimelineService};
