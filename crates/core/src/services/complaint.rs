//! Complaint lifecycle service.
//!
//! Creation and updates write the complaint row and its timeline entries in
//! one transaction. Updates are planned against the row as locked inside that
//! transaction, so every `old_value` recorded is the committed value the
//! update replaced.

use crate::services::event_publisher::{ChangeEvent, EventPublisherService};
use crate::viewer::Viewer;
use chrono::{DateTime, Utc};
use connect_common::{AppError, AppResult, IdGenerator};
use connect_db::{
    entities::{
        complaint::{self, ComplaintCategory, ComplaintPriority, ComplaintStatus},
        complaint_timeline::{self, TimelineAction},
        profile,
        user_role::Role,
    },
    repositories::{
        ComplaintFilter, ComplaintRepository, LockedUpdate, ProfileRepository, UserRoleRepository,
    },
};
use sea_orm::Set;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};
use validator::Validate;

/// Longest admin note accepted on an update.
pub const MAX_NOTE_CHARS: usize = 2000;

/// Input for raising a complaint.
#[derive(Debug, Clone, Validate)]
pub struct CreateComplaintInput {
    #[validate(length(min = 5, max = 100, message = "title must be 5 to 100 characters"))]
    pub title: String,
    #[validate(length(
        min = 20,
        max = 1000,
        message = "description must be 20 to 1000 characters"
    ))]
    pub description: String,
    pub category: ComplaintCategory,
    /// Defaults to Medium.
    pub priority: Option<ComplaintPriority>,
    /// Defaults to the creator's profile center.
    pub center: Option<String>,
    pub is_anonymous: bool,
    pub attachment_url: Option<String>,
}

/// Requested changes to a complaint. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ComplaintChanges {
    pub status: Option<ComplaintStatus>,
    pub priority: Option<ComplaintPriority>,
    pub category: Option<ComplaintCategory>,
    /// Hand the complaint to another admin.
    pub assigned_admin_id: Option<String>,
    /// Free-text note recorded as its own timeline entry.
    pub note: Option<String>,
    /// When set, the update only applies if the stored version still matches.
    pub expected_version: Option<i32>,
}

/// One timeline entry an update will append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub action: TimelineAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub notes: Option<String>,
}

/// The writes an update resolves to, decided against the current row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    pub status: Option<ComplaintStatus>,
    pub priority: Option<ComplaintPriority>,
    pub category: Option<ComplaintCategory>,
    pub assigned_admin_id: Option<String>,
    pub entries: Vec<PlannedEntry>,
}

impl UpdatePlan {
    /// Whether the complaint row itself changes.
    #[must_use]
    pub const fn changes_fields(&self) -> bool {
        self.status.is_some()
            || self.priority.is_some()
            || self.category.is_some()
            || self.assigned_admin_id.is_some()
    }

    fn into_locked_update(
        self,
        current: &complaint::Model,
        actor_id: &str,
        ids: &[String],
        now: DateTime<Utc>,
    ) -> LockedUpdate {
        let changes = self.changes_fields().then(|| {
            let mut row: complaint::ActiveModel = current.clone().into();
            if let Some(status) = self.status {
                row.status = Set(status);
            }
            if let Some(priority) = self.priority {
                row.priority = Set(priority);
            }
            if let Some(category) = self.category {
                row.category = Set(category);
            }
            if let Some(admin_id) = &self.assigned_admin_id {
                row.assigned_admin_id = Set(Some(admin_id.clone()));
            }
            row.version = Set(current.version + 1);
            row.updated_at = Set(now.into());
            row
        });

        let entries = self
            .entries
            .into_iter()
            .zip(ids)
            .map(|(entry, id)| complaint_timeline::ActiveModel {
                id: Set(id.clone()),
                complaint_id: Set(current.id.clone()),
                action_type: Set(entry.action),
                old_value: Set(entry.old_value),
                new_value: Set(entry.new_value),
                notes: Set(entry.notes),
                action_by: Set(actor_id.to_string()),
                created_at: Set(now.into()),
            })
            .collect();

        LockedUpdate { changes, entries }
    }
}

/// Timestamp for writes planned against the locked row `current`.
///
/// Read only once the lock is held, and never earlier than the row's last
/// update, so new entries sort after the history they continue.
pub fn write_time(current: &complaint::Model) -> DateTime<Utc> {
    Utc::now().max(current.updated_at.with_timezone(&Utc))
}

/// Decide what an admin update does to `current`.
///
/// Entries come out in a fixed order: status, priority, category, assignment,
/// note. A field equal to its current value produces nothing.
pub fn plan_update(
    current: &complaint::Model,
    changes: &ComplaintChanges,
    actor_id: &str,
) -> AppResult<UpdatePlan> {
    if let Some(expected) = changes.expected_version
        && expected != current.version
    {
        return Err(AppError::Conflict(format!(
            "complaint {} was changed by someone else (version {} is now {})",
            current.id, expected, current.version
        )));
    }

    let mut plan = UpdatePlan::default();

    if let Some(status) = changes.status.filter(|s| *s != current.status) {
        plan.status = Some(status);
        plan.entries.push(PlannedEntry {
            action: TimelineAction::StatusChanged,
            old_value: Some(current.status.as_str().to_string()),
            new_value: Some(status.as_str().to_string()),
            notes: None,
        });
    }

    if let Some(priority) = changes.priority.filter(|p| *p != current.priority) {
        plan.priority = Some(priority);
        plan.entries.push(PlannedEntry {
            action: TimelineAction::PriorityChanged,
            old_value: Some(current.priority.as_str().to_string()),
            new_value: Some(priority.as_str().to_string()),
            notes: None,
        });
    }

    if let Some(category) = changes.category.filter(|c| *c != current.category) {
        plan.category = Some(category);
        plan.entries.push(PlannedEntry {
            action: TimelineAction::CategoryChanged,
            old_value: Some(current.category.as_str().to_string()),
            new_value: Some(category.as_str().to_string()),
            notes: None,
        });
    }

    let assignee = match changes.assigned_admin_id.as_deref() {
        Some(target) if current.assigned_admin_id.as_deref() != Some(target) => Some(target),
        Some(_) => None,
        None if current.assigned_admin_id.is_none() => Some(actor_id),
        None => None,
    };
    if let Some(assignee) = assignee {
        plan.assigned_admin_id = Some(assignee.to_string());
        plan.entries.push(PlannedEntry {
            action: TimelineAction::Assigned,
            old_value: current.assigned_admin_id.clone(),
            new_value: Some(assignee.to_string()),
            notes: None,
        });
    }

    if let Some(note) = changes.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        plan.entries.push(PlannedEntry {
            action: TimelineAction::AdminNote,
            old_value: None,
            new_value: None,
            notes: Some(note.to_string()),
        });
    }

    Ok(plan)
}

/// Identity shown next to a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub full_name: String,
    pub email: String,
    pub center: Option<String>,
    pub avatar_url: Option<String>,
}

impl PersonSummary {
    fn anonymous() -> Self {
        Self {
            full_name: "Anonymous".to_string(),
            email: "Hidden".to_string(),
            center: None,
            avatar_url: None,
        }
    }
}

impl From<&profile::Model> for PersonSummary {
    fn from(p: &profile::Model) -> Self {
        Self {
            full_name: p.full_name.clone(),
            email: p.email.clone(),
            center: p.center.clone(),
            avatar_url: p.avatar_url.clone(),
        }
    }
}

/// A complaint as a particular viewer may see it.
#[derive(Debug, Clone)]
pub struct ComplaintView {
    pub complaint: complaint::Model,
    pub creator: Option<PersonSummary>,
    pub assigned_admin: Option<PersonSummary>,
    /// The creator's identity was withheld from this viewer.
    pub identity_hidden: bool,
}

impl ComplaintView {
    /// Replace the creator with "Anonymous"/"Hidden" when an admin views an
    /// anonymous complaint. The stored owner is untouched.
    #[must_use]
    pub fn redacted_for(mut self, viewer: &Viewer) -> Self {
        if viewer.is_admin() && self.complaint.is_anonymous {
            self.creator = Some(PersonSummary::anonymous());
            self.identity_hidden = true;
        }
        self
    }
}

/// Result of an admin update.
#[derive(Debug, Clone)]
pub struct ComplaintUpdate {
    pub complaint: complaint::Model,
    pub entries: Vec<complaint_timeline::Model>,
}

/// Load a complaint the viewer may see. Anything else is reported as not found.
pub(crate) async fn visible_complaint(
    repo: &ComplaintRepository,
    viewer: &Viewer,
    id: &str,
) -> AppResult<complaint::Model> {
    let complaint = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::ComplaintNotFound(id.to_string()))?;

    if viewer.is_admin() || complaint.user_id == viewer.id {
        Ok(complaint)
    } else {
        Err(AppError::ComplaintNotFound(id.to_string()))
    }
}

/// Complaint service.
#[derive(Clone)]
pub struct ComplaintService {
    complaint_repo: ComplaintRepository,
    profile_repo: ProfileRepository,
    user_role_repo: UserRoleRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl ComplaintService {
    /// Create a new complaint service.
    #[must_use]
    pub const fn new(
        complaint_repo: ComplaintRepository,
        profile_repo: ProfileRepository,
        user_role_repo: UserRoleRepository,
    ) -> Self {
        Self {
            complaint_repo,
            profile_repo,
            user_role_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Raise a complaint and record its `created` entry.
    pub async fn create_complaint(
        &self,
        viewer: &Viewer,
        input: CreateComplaintInput,
    ) -> AppResult<complaint::Model> {
        viewer.require_student()?;

        let input = CreateComplaintInput {
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            ..input
        };
        input.validate()?;

        let center = match input.center.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(center) => center.to_string(),
            None => viewer
                .center
                .clone()
                .ok_or_else(|| AppError::Validation("center is required".to_string()))?,
        };

        let now = Utc::now();
        let complaint_id = self.id_gen.generate();
        let status = ComplaintStatus::Pending;

        let model = complaint::ActiveModel {
            id: Set(complaint_id.clone()),
            user_id: Set(viewer.id.clone()),
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            priority: Set(input.priority.unwrap_or_default()),
            status: Set(status),
            center: Set(center),
            is_anonymous: Set(input.is_anonymous),
            attachment_url: Set(input.attachment_url),
            assigned_admin_id: Set(None),
            version: Set(1),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let entry = complaint_timeline::ActiveModel {
            id: Set(self.id_gen.generate()),
            complaint_id: Set(complaint_id),
            action_type: Set(TimelineAction::Created),
            old_value: Set(None),
            new_value: Set(Some(status.as_str().to_string())),
            notes: Set(None),
            action_by: Set(viewer.id.clone()),
            created_at: Set(now.into()),
        };

        let (complaint, _entry) = self.complaint_repo.create_with_entry(model, entry).await?;

        info!(complaint_id = %complaint.id, user_id = %viewer.id, "Complaint created");
        self.publish(ChangeEvent::complaint(&complaint)).await;

        Ok(complaint)
    }

    /// Apply an admin update and append the matching timeline entries.
    pub async fn update_complaint(
        &self,
        viewer: &Viewer,
        id: &str,
        changes: ComplaintChanges,
    ) -> AppResult<ComplaintUpdate> {
        if !viewer.is_admin() {
            return Err(AppError::ComplaintNotFound(id.to_string()));
        }

        if let Some(note) = &changes.note
            && note.trim().chars().count() > MAX_NOTE_CHARS
        {
            return Err(AppError::Validation(format!(
                "note must be at most {MAX_NOTE_CHARS} characters"
            )));
        }

        if let Some(target) = &changes.assigned_admin_id {
            let role = self.user_role_repo.find_by_user_id(target).await?;
            if role.map(|r| r.role) != Some(Role::Admin) {
                return Err(AppError::Validation(format!(
                    "{target} is not an administrator"
                )));
            }
        }

        let id_gen = &self.id_gen;
        let (complaint, entries) = self
            .complaint_repo
            .update_locked(id, |current| {
                let plan = plan_update(current, &changes, &viewer.id)?;
                let ids = id_gen.generate_ordered(plan.entries.len());
                Ok(plan.into_locked_update(current, &viewer.id, &ids, write_time(current)))
            })
            .await?;

        if !entries.is_empty() {
            info!(
                complaint_id = %complaint.id,
                actor = %viewer.id,
                entries = entries.len(),
                version = complaint.version,
                "Complaint updated"
            );
            self.publish(ChangeEvent::complaint(&complaint)).await;
        }

        Ok(ComplaintUpdate { complaint, entries })
    }

    /// Fetch one complaint with its people resolved.
    pub async fn get_complaint(&self, viewer: &Viewer, id: &str) -> AppResult<ComplaintView> {
        let complaint = visible_complaint(&self.complaint_repo, viewer, id).await?;
        let mut views = self.build_views(vec![complaint]).await?;
        views
            .pop()
            .map(|view| view.redacted_for(viewer))
            .ok_or_else(|| AppError::ComplaintNotFound(id.to_string()))
    }

    /// List complaints. Students only ever see their own.
    pub async fn list_complaints(
        &self,
        viewer: &Viewer,
        mut filter: ComplaintFilter,
    ) -> AppResult<Vec<ComplaintView>> {
        if !viewer.is_admin() {
            filter.user_id = Some(viewer.id.clone());
        }
        filter.limit = filter.limit.clamp(1, 100);

        let complaints = self.complaint_repo.find_filtered(&filter).await?;
        let views = self.build_views(complaints).await?;

        Ok(views.into_iter().map(|v| v.redacted_for(viewer)).collect())
    }

    async fn build_views(&self, complaints: Vec<complaint::Model>) -> AppResult<Vec<ComplaintView>> {
        let mut ids: Vec<String> = complaints
            .iter()
            .flat_map(|c| std::iter::once(c.user_id.clone()).chain(c.assigned_admin_id.clone()))
            .collect();
        ids.sort();
        ids.dedup();

        let people: HashMap<String, PersonSummary> = self
            .profile_repo
            .find_by_ids(&ids)
            .await?
            .iter()
            .map(|p| (p.id.clone(), PersonSummary::from(p)))
            .collect();

        Ok(complaints
            .into_iter()
            .map(|complaint| ComplaintView {
                creator: people.get(&complaint.user_id).cloned(),
                assigned_admin: complaint
                    .assigned_admin_id
                    .as_ref()
                    .and_then(|id| people.get(id).cloned()),
                complaint,
                identity_hidden: false,
            })
            .collect())
    }

    async fn publish(&self, event: ChangeEvent) {
        if let Some(ref event_publisher) = self.event_publisher
            && let Err(e) = event_publisher.publish(event).await
        {
            warn!(error = %e, "Failed to publish complaint event");
        }
    }
}
