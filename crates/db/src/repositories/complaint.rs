//! Complaint repository.

use crate::entities::{
    complaint::{
        self, ActiveModel, Column, ComplaintCategory, ComplaintStatus, Entity as Complaint,
    },
    complaint_timeline,
};
use connect_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, Func},
};
use std::sync::Arc;

/// Listing filter for complaints.
#[derive(Debug, Clone, Default)]
pub struct ComplaintFilter {
    /// Restrict to one owner.
    pub user_id: Option<String>,
    pub status: Option<ComplaintStatus>,
    pub category: Option<ComplaintCategory>,
    pub center: Option<String>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

/// Writes decided against the locked row inside [`ComplaintRepository::update_locked`].
#[derive(Debug, Default)]
pub struct LockedUpdate {
    /// Field changes, if any.
    pub changes: Option<ActiveModel>,
    /// Timeline entries to append, in order.
    pub entries: Vec<complaint_timeline::ActiveModel>,
}

/// Repository for complaint operations.
#[derive(Clone)]
pub struct ComplaintRepository {
    db: Arc<DatabaseConnection>,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a complaint together with its `created` timeline entry.
    ///
    /// Both rows commit or neither does.
    pub async fn create_with_entry(
        &self,
        model: ActiveModel,
        entry: complaint_timeline::ActiveModel,
    ) -> AppResult<(complaint::Model, complaint_timeline::Model)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let complaint = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let entry = entry
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((complaint, entry))
    }

    /// Lock a complaint row, let `plan` decide the writes, and apply them.
    ///
    /// The row is read with `SELECT ... FOR UPDATE`, so `plan` always sees the
    /// committed state and concurrent updates to one complaint serialize. An
    /// error from `plan` rolls the transaction back without writing anything.
    pub async fn update_locked<F>(
        &self,
        id: &str,
        plan: F,
    ) -> AppResult<(complaint::Model, Vec<complaint_timeline::Model>)>
    where
        F: FnOnce(&complaint::Model) -> AppResult<LockedUpdate> + Send,
    {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let current = Complaint::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::ComplaintNotFound(id.to_string()))?;

        let LockedUpdate { changes, entries } = plan(&current)?;

        let updated = match changes {
            Some(changes) => changes
                .update(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
            None => current,
        };

        let mut written = Vec::with_capacity(entries.len());
        for entry in entries {
            written.push(
                entry
                    .insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?,
            );
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((updated, written))
    }

    /// Find a complaint by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<complaint::Model>> {
        Complaint::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List complaints, newest first.
    pub async fn find_filtered(&self, filter: &ComplaintFilter) -> AppResult<Vec<complaint::Model>> {
        let mut condition = Condition::all();

        if let Some(user_id) = &filter.user_id {
            condition = condition.add(Column::UserId.eq(user_id.as_str()));
        }
        if let Some(status) = filter.status {
            condition = condition.add(Column::Status.eq(status));
        }
        if let Some(category) = filter.category {
            condition = condition.add(Column::Category.eq(category));
        }
        if let Some(center) = &filter.center {
            condition = condition.add(Column::Center.eq(center.as_str()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = super::contains_pattern(search);
            condition = condition
                .add(Expr::expr(Func::lower(Expr::col((Complaint, Column::Title)))).like(pattern));
        }

        Complaint::find()
            .filter(condition)
            .order_by_desc(Column::CreatedAt)
            .limit(filter.limit)
            .offset(filter.offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count complaints in a status, optionally for one owner.
    pub async fn count_by_status(
        &self,
        status: ComplaintStatus,
        user_id: Option<&str>,
    ) -> AppResult<u64> {
        let mut query = Complaint::find().filter(Column::Status.eq(status));
        if let Some(user_id) = user_id {
            query = query.filter(Column::UserId.eq(user_id));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all complaints of one owner.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Complaint::find()
            .filter(Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all complaints.
    pub async fn count_all(&self) -> AppResult<u64> {
        Complaint::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Complaint counts grouped by category.
    pub async fn count_by_category(&self) -> AppResult<Vec<(ComplaintCategory, i64)>> {
        Complaint::find()
            .select_only()
            .column(Column::Category)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::Category)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Complaint counts grouped by center.
    pub async fn count_by_center(&self) -> AppResult<Vec<(String, i64)>> {
        Complaint::find()
            .select_only()
            .column(Column::Center)
            .column_as(Column::Id.count(), "count")
            .group_by(Column::Center)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Creation timestamps of complaints raised at or after `since`.
    pub async fn created_since(
        &self,
        since: DateTimeWithTimeZone,
    ) -> AppResult<Vec<DateTimeWithTimeZone>> {
        Complaint::find()
            .select_only()
            .column(Column::CreatedAt)
            .filter(Column::CreatedAt.gte(since))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::complaint_timeline::TimelineAction;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Set, Value};

    fn complaint_model(id: &str, status: ComplaintStatus) -> complaint::Model {
        complaint::Model {
            id: id.to_string(),
            user_id: "student1".to_string(),
            title: "Projector broken".to_string(),
            description: "The projector in room 4 has not worked all week.".to_string(),
            category: ComplaintCategory::Facility,
            priority: complaint::ComplaintPriority::Medium,
            status,
            center: "Kochi".to_string(),
            is_anonymous: false,
            attachment_url: None,
            assigned_admin_id: None,
            version: 1,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn entry_model(id: &str, action: TimelineAction) -> complaint_timeline::Model {
        complaint_timeline::Model {
            id: id.to_string(),
            complaint_id: "c1".to_string(),
            action_type: action,
            old_value: None,
            new_value: Some("Pending".to_string()),
            notes: None,
            action_by: "student1".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_with_entry_returns_both_rows() {
        let complaint = complaint_model("c1", ComplaintStatus::Pending);
        let entry = entry_model("t1", TimelineAction::Created);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[complaint.clone()]])
                .append_query_results([[entry.clone()]])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let (created, created_entry) = repo
            .create_with_entry(complaint.clone().into(), entry.clone().into())
            .await
            .unwrap();

        assert_eq!(created.id, "c1");
        assert_eq!(created_entry.action_type, TimelineAction::Created);
    }

    #[tokio::test]
    async fn test_find_filtered_matches_wildcards_literally() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<complaint::Model>::new()])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db.clone());
        let filter = ComplaintFilter {
            search: Some("100%_Done".to_string()),
            limit: 20,
            ..Default::default()
        };
        assert!(repo.find_filtered(&filter).await.unwrap().is_empty());

        drop(repo);
        let db = Arc::try_unwrap(db).unwrap_or_else(|_| panic!("connection still shared"));
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(r"%100\\%\\_done%"));
    }

    #[tokio::test]
    async fn test_update_locked_missing_row_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<complaint::Model>::new()])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let result = repo
            .update_locked("missing", |_| Ok(LockedUpdate::default()))
            .await;

        assert!(matches!(result, Err(AppError::ComplaintNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_locked_plan_error_writes_nothing() {
        let current = complaint_model("c1", ComplaintStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[current]])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let result = repo
            .update_locked("c1", |_| Err(AppError::Conflict("stale".to_string())))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_locked_applies_changes_and_entries() {
        let current = complaint_model("c1", ComplaintStatus::Pending);
        let mut updated = current.clone();
        updated.status = ComplaintStatus::InProgress;
        updated.version = 2;
        let entry = entry_model("t2", TimelineAction::StatusChanged);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[current]])
                .append_query_results([[updated.clone()]])
                .append_query_results([[entry.clone()]])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let (complaint, entries) = repo
            .update_locked("c1", |row| {
                let mut changes: ActiveModel = row.clone().into();
                changes.status = Set(ComplaintStatus::InProgress);
                changes.version = Set(row.version + 1);
                Ok(LockedUpdate {
                    changes: Some(changes),
                    entries: vec![entry.clone().into()],
                })
            })
            .await
            .unwrap();

        assert_eq!(complaint.status, ComplaintStatus::InProgress);
        assert_eq!(complaint.version, 2);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action_type, TimelineAction::StatusChanged);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(3)),
                }]])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let count = repo
            .count_by_status(ComplaintStatus::Pending, Some("student1"))
            .await
            .unwrap();

        assert_eq!(count, 3);
    }
}
