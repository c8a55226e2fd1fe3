//! Complaint entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What the complaint is about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ComplaintCategory {
    #[sea_orm(string_value = "Technical")]
    Technical,
    #[sea_orm(string_value = "Mentor")]
    Mentor,
    #[sea_orm(string_value = "Facility")]
    Facility,
    #[sea_orm(string_value = "Other")]
    Other,
}

/// Triage priority.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ComplaintPriority {
    #[sea_orm(string_value = "Low")]
    Low,
    #[sea_orm(string_value = "Medium")]
    #[default]
    Medium,
    #[sea_orm(string_value = "High")]
    High,
}

/// Lifecycle state. Transitions between any two states are allowed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ComplaintStatus {
    #[sea_orm(string_value = "Pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Resolved")]
    Resolved,
}

impl ComplaintCategory {
    /// Stored and displayed name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Technical => "Technical",
            Self::Mentor => "Mentor",
            Self::Facility => "Facility",
            Self::Other => "Other",
        }
    }
}

impl ComplaintPriority {
    /// Stored and displayed name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl ComplaintStatus {
    /// Stored and displayed name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}

/// Complaint model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// The student who raised the complaint. Kept even when anonymous.
    pub user_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: ComplaintCategory,
    pub priority: ComplaintPriority,
    pub status: ComplaintStatus,
    pub center: String,
    /// Hide the creator's identity from admins.
    pub is_anonymous: bool,
    pub attachment_url: Option<String>,
    /// Admin currently responsible, once one has touched the complaint.
    pub assigned_admin_id: Option<String>,
    /// Optimistic concurrency counter, bumped on every committed update.
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::complaint_timeline::Entity")]
    Timeline,
    #[sea_orm(has_many = "super::message::Entity")]
    Message,
    #[sea_orm(has_one = "super::feedback::Entity")]
    Feedback,
}

impl Related<super::complaint_timeline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Timeline.def()
    }
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Message.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&ComplaintStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        let parsed: ComplaintStatus = serde_json::from_str("\"Resolved\"").unwrap();
        assert_eq!(parsed, ComplaintStatus::Resolved);
        assert_eq!(ComplaintStatus::InProgress.to_value(), "In Progress");
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let parsed: Result<ComplaintCategory, _> = serde_json::from_str("\"Hostel\"");
        assert!(parsed.is_err());
    }
}
