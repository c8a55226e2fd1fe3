//! Timeline service.

use crate::services::complaint::visible_complaint;
use crate::viewer::Viewer;
use chrono::Utc;
use connect_common::{AppResult, IdGenerator};
use connect_db::{
    entities::complaint_timeline::{self, TimelineAction},
    repositories::{ComplaintRepository, ProfileRepository, TimelineRepository},
};
use sea_orm::Set;
use std::collections::HashMap;

/// Values recorded with a single entry.
#[derive(Debug, Clone, Default)]
pub struct EntryValues {
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub notes: Option<String>,
}

/// A timeline entry ready for display.
#[derive(Debug, Clone)]
pub struct TimelineItem {
    pub entry: complaint_timeline::Model,
    pub title: String,
    pub actor_name: Option<String>,
    /// The actor is the anonymous owner and must not be shown to this viewer.
    pub actor_hidden: bool,
}

/// Timeline service for complaint history.
#[derive(Clone)]
pub struct TimelineService {
    timeline_repo: TimelineRepository,
    complaint_repo: ComplaintRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

impl TimelineService {
    /// Create a new timeline service.
    #[must_use]
    pub const fn new(
        timeline_repo: TimelineRepository,
        complaint_repo: ComplaintRepository,
        profile_repo: ProfileRepository,
    ) -> Self {
        Self {
            timeline_repo,
            complaint_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append one entry outside any complaint update.
    pub async fn append_entry(
        &self,
        complaint_id: &str,
        action: TimelineAction,
        actor_id: &str,
        values: EntryValues,
    ) -> AppResult<complaint_timeline::Model> {
        let model = complaint_timeline::ActiveModel {
            id: Set(self.id_gen.generate()),
            complaint_id: Set(complaint_id.to_string()),
            action_type: Set(action),
            old_value: Set(values.old_value),
            new_value: Set(values.new_value),
            notes: Set(values.notes),
            action_by: Set(actor_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        self.timeline_repo.append(model).await
    }

    /// History of a complaint, oldest first.
    pub async fn list_timeline(
        &self,
        viewer: &Viewer,
        complaint_id: &str,
    ) -> AppResult<Vec<TimelineItem>> {
        let complaint = visible_complaint(&self.complaint_repo, viewer, complaint_id).await?;
        let entries = self.timeline_repo.find_by_complaint(complaint_id).await?;

        let mut actor_ids: Vec<String> = entries.iter().map(|e| e.action_by.clone()).collect();
        actor_ids.sort();
        actor_ids.dedup();

        let names: HashMap<String, String> = self
            .profile_repo
            .find_by_ids(&actor_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.full_name))
            .collect();

        let hide_owner = viewer.is_admin() && complaint.is_anonymous;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let actor_hidden = hide_owner && entry.action_by == complaint.user_id;
                let actor_name = if actor_hidden {
                    Some("Anonymous".to_string())
                } else {
                    names.get(&entry.action_by).cloned()
                };
                TimelineItem {
                    title: entry
                        .action_type
                        .title(entry.old_value.as_deref(), entry.new_value.as_deref()),
                    actor_name,
                    actor_hidden,
                    entry,
                }
            })
            .collect())
    }
}
