/// Archived task snapshots
///
/// Archiving is the soft-delete path for tasks: the live row is replaced by
/// a snapshot carrying the original field values plus who deleted it and
/// when. Restoring recreates the task under its original ID and removes the
/// snapshot. Both directions are single transactions, so a task is never
/// visible in both tables and never missing from both.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::task::{Task, TaskStatus};

const ARCHIVE_COLUMNS: &str = "id, task_id, title, description, status, assigned_to, \
     project_id, due_date, deleted_by, deleted_at";

/// Snapshot of a task at archive time
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArchivedTask {
    /// Unique archive row ID
    pub id: Uuid,

    /// ID the live task had (and gets back on restore)
    pub task_id: Uuid,

    /// Title at archive time
    pub title: String,

    /// Description at archive time
    pub description: Option<String>,

    /// Status at archive time
    pub status: TaskStatus,

    /// Assignee at archive time
    pub assigned_to: Option<Uuid>,

    /// Project at archive time
    pub project_id: Option<Uuid>,

    /// Due date at archive time
    pub due_date: Option<NaiveDate>,

    /// Actor who archived the task
    pub deleted_by: Uuid,

    /// When the task was archived
    pub deleted_at: DateTime<Utc>,
}

impl ArchivedTask {
    /// Archives a live task: snapshot in, live row out, atomically
    pub async fn archive(
        pool: &PgPool,
        task: &Task,
        deleted_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let archived = sqlx::query_as::<_, ArchivedTask>(&format!(
            r#"
            INSERT INTO archived_tasks
                (task_id, title, description, status, assigned_to, project_id,
                 due_date, deleted_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ARCHIVE_COLUMNS}
            "#,
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.assigned_to)
        .bind(task.project_id)
        .bind(task.due_date)
        .bind(deleted_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(archived)
    }

    /// Restores an archived task under its original ID, atomically
    ///
    /// # Errors
    ///
    /// Fails if the original ID has been reused or the snapshot's project
    /// no longer satisfies the foreign key; nothing changes in that case.
    pub async fn restore(pool: &PgPool, archived: &ArchivedTask) -> Result<Task, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks
                (id, title, description, status, assigned_to, project_id, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, status, assigned_to, project_id,
                      due_date, created_at, updated_at
            "#,
        )
        .bind(archived.task_id)
        .bind(&archived.title)
        .bind(&archived.description)
        .bind(archived.status)
        .bind(archived.assigned_to)
        .bind(archived.project_id)
        .bind(archived.due_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM archived_tasks WHERE id = $1")
            .bind(archived.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(task)
    }

    /// Finds an archive row by the original task ID
    pub async fn find_by_task_id(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ArchivedTask>(&format!(
            "SELECT {ARCHIVE_COLUMNS} FROM archived_tasks WHERE task_id = $1",
        ))
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists all archived tasks with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ArchivedTask>(&format!(
            r#"
            SELECT {ARCHIVE_COLUMNS}
            FROM archived_tasks
            ORDER BY deleted_at DESC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts all archived tasks
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM archived_tasks")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Lists archived tasks that were assigned to one user
    pub async fn list_by_assignee(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ArchivedTask>(&format!(
            r#"
            SELECT {ARCHIVE_COLUMNS}
            FROM archived_tasks
            WHERE assigned_to = $1
            ORDER BY deleted_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts archived tasks that were assigned to one user
    pub async fn count_by_assignee(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM archived_tasks WHERE assigned_to = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Lists archived tasks from projects owned by one user
    ///
    /// Team-leader scope for the archive listing.
    pub async fn list_by_project_owner(
        pool: &PgPool,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ArchivedTask>(
            r#"
            SELECT a.id, a.task_id, a.title, a.description, a.status, a.assigned_to,
                   a.project_id, a.due_date, a.deleted_by, a.deleted_at
            FROM archived_tasks a
            JOIN projects p ON a.project_id = p.id
            WHERE p.owner_id = $1
            ORDER BY a.deleted_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts archived tasks from projects owned by one user
    pub async fn count_by_project_owner(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM archived_tasks a
            JOIN projects p ON a.project_id = p.id
            WHERE p.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
