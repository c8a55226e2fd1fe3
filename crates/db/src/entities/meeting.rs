//! Meeting request entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Meeting request state.
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
pub enum MeetingStatus {
    #[sea_orm(string_value = "Pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "Accepted")]
    Accepted,
    #[sea_orm(string_value = "Rescheduled")]
    Rescheduled,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

/// A student's request to meet an admin, optionally about one complaint.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meeting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub student_id: String,
    pub complaint_id: Option<String>,
    /// Admin who last handled the request.
    pub admin_id: Option<String>,
    pub requested_date_time: DateTimeWithTimeZone,
    pub scheduled_date_time: Option<DateTimeWithTimeZone>,
    pub status: MeetingStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub meeting_link: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
