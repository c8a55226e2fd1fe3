//! Admin analytics.

use crate::viewer::Viewer;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use connect_common::AppResult;
use connect_db::{
    entities::{complaint::ComplaintStatus, user_role::Role},
    repositories::{CenterRepository, ComplaintRepository, FeedbackRepository, UserRoleRepository},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

/// Days covered by the trend series.
pub const TREND_DAYS: i64 = 7;

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_complaints: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub total_students: u64,
    pub total_centers: u64,
}

/// A labelled count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

/// Complaints raised on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Analytics overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_complaints: u64,
    pub total_students: u64,
    /// Rounded to one decimal; 0 when there is no feedback.
    pub average_rating: f64,
    pub by_category: Vec<NamedCount>,
    pub by_center: Vec<NamedCount>,
    pub trend: Vec<DayCount>,
}

/// Round to one decimal place.
#[must_use]
pub fn round_rating(average: Option<f64>) -> f64 {
    average.map_or(0.0, |avg| (avg * 10.0).round() / 10.0)
}

/// Per-day counts for the `TREND_DAYS` days ending on `today`, oldest first.
#[must_use]
pub fn daily_trend(created: &[DateTimeWithTimeZone], today: NaiveDate) -> Vec<DayCount> {
    (0..TREND_DAYS)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let count = created
                .iter()
                .filter(|at| at.with_timezone(&Utc).date_naive() == date)
                .count();
            DayCount {
                date,
                count: i64::try_from(count).unwrap_or(i64::MAX),
            }
        })
        .collect()
}

/// Analytics service.
#[derive(Clone)]
pub struct AnalyticsService {
    complaint_repo: ComplaintRepository,
    user_role_repo: UserRoleRepository,
    center_repo: CenterRepository,
    feedback_repo: FeedbackRepository,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(
        complaint_repo: ComplaintRepository,
        user_role_repo: UserRoleRepository,
        center_repo: CenterRepository,
        feedback_repo: FeedbackRepository,
    ) -> Self {
        Self {
            complaint_repo,
            user_role_repo,
            center_repo,
            feedback_repo,
        }
    }

    /// Status counts and population totals.
    pub async fn dashboard(&self, viewer: &Viewer) -> AppResult<DashboardStats> {
        viewer.require_admin()?;

        let pending = self
            .complaint_repo
            .count_by_status(ComplaintStatus::Pending, None)
            .await?;
        let in_progress = self
            .complaint_repo
            .count_by_status(ComplaintStatus::InProgress, None)
            .await?;
        let resolved = self
            .complaint_repo
            .count_by_status(ComplaintStatus::Resolved, None)
            .await?;

        Ok(DashboardStats {
            total_complaints: pending + in_progress + resolved,
            pending,
            in_progress,
            resolved,
            total_students: self.user_role_repo.count_by_role(Role::Student).await?,
            total_centers: self.center_repo.count().await?,
        })
    }

    /// Distributions, rating and the recent trend as of `now`.
    pub async fn overview(&self, viewer: &Viewer, now: DateTime<Utc>) -> AppResult<Overview> {
        viewer.require_admin()?;

        let today = now.date_naive();
        let since = (today - Duration::days(TREND_DAYS - 1))
            .and_hms_opt(0, 0, 0)
            .map_or(now, |start| start.and_utc());

        let total_complaints = self.complaint_repo.count_all().await?;
        let total_students = self.user_role_repo.count_by_role(Role::Student).await?;
        let average_rating = round_rating(self.feedback_repo.average_rating().await?);
        let by_category = self
            .complaint_repo
            .count_by_category()
            .await?
            .into_iter()
            .map(|(category, count)| NamedCount {
                name: category.as_str().to_string(),
                count,
            })
            .collect();
        let by_center = self
            .complaint_repo
            .count_by_center()
            .await?
            .into_iter()
            .map(|(name, count)| NamedCount { name, count })
            .collect();
        let created = self.complaint_repo.created_since(since.into()).await?;

        Ok(Overview {
            total_complaints,
            total_students,
            average_rating,
            by_category,
            by_center,
            trend: daily_trend(&created, today),
        })
    }
}
