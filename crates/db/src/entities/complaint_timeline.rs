//! Complaint timeline entity.
//!
//! Rows are append-only; nothing in the crate updates or deletes them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of lifecycle event recorded on a complaint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum TimelineAction {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "status_changed")]
    StatusChanged,
    #[sea_orm(string_value = "priority_changed")]
    PriorityChanged,
    #[sea_orm(string_value = "category_changed")]
    CategoryChanged,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "admin_note")]
    AdminNote,
    /// Written by the old quick-edit screen; read but never produced.
    #[sea_orm(string_value = "status_updated")]
    StatusUpdated,
}

impl TimelineAction {
    /// Human-readable heading for an entry.
    #[must_use]
    pub fn title(self, old_value: Option<&str>, new_value: Option<&str>) -> String {
        let change = |field: &str| {
            format!(
                "{field}: {} \u{2192} {}",
                old_value.unwrap_or("-"),
                new_value.unwrap_or("-")
            )
        };
        match self {
            Self::Created => "Complaint Created".to_string(),
            Self::StatusChanged => change("Status"),
            Self::PriorityChanged => change("Priority"),
            Self::CategoryChanged => change("Category"),
            Self::Assigned => "Assigned to Admin".to_string(),
            Self::AdminNote => "Admin Note".to_string(),
            Self::StatusUpdated => "Status updated".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint_timeline")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub complaint_id: String,
    pub action_type: TimelineAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    /// Identity that caused the event.
    pub action_by: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::complaint::Entity",
        from = "Column::ComplaintId",
        to = "super::complaint::Column::Id",
        on_delete = "Cascade"
    )]
    Complaint,
}

impl Related<super::complaint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Complaint.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        assert_eq!(
            TimelineAction::StatusChanged.title(Some("Pending"), Some("In Progress")),
            "Status: Pending \u{2192} In Progress"
        );
        assert_eq!(TimelineAction::Created.title(None, Some("Pending")), "Complaint Created");
        assert_eq!(TimelineAction::Assigned.title(None, Some("a1")), "Assigned to Admin");
        assert_eq!(TimelineAction::StatusUpdated.title(None, None), "Status updated");
    }

    #[test]
    fn test_legacy_action_parses() {
        let action: TimelineAction = serde_json::from_str("\"status_updated\"").unwrap();
        assert_eq!(action, TimelineAction::StatusUpdated);
    }
}
