/// Task model, assignment, and audit history
///
/// Tasks are the unit of work inside a project. Two mutations are audited:
/// a partial update (which may move status or assignee) and an explicit
/// assignment. Both append exactly one [`TaskHistory`] row in the same
/// transaction as the change, and assignment always resets the status to
/// `Pending`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(100) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'pending',
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     project_id UUID REFERENCES projects(id) ON DELETE SET NULL,
///     due_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (project_id, title)
/// );
/// ```
///
/// The `(project_id, title)` constraint is the schema-level backstop for
/// the title-unique-within-project invariant; handlers also pre-check so
/// the common case returns a field-keyed error without touching the
/// constraint.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, title, description, status, assigned_to, project_id, \
     due_date, created_at, updated_at";

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued; also the state every fresh assignment resets to
    #[serde(rename = "Pending")]
    Pending,

    /// Being worked on
    #[serde(rename = "In Progress")]
    InProgress,

    /// Done; feeds the productivity analytics
    #[serde(rename = "Completed")]
    Completed,
}

impl TaskStatus {
    /// Status as serialized on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Title, unique within its project
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Lifecycle status
    pub status: TaskStatus,

    /// Assigned user, if any
    pub assigned_to: Option<Uuid>,

    /// Owning project; null once the project is deleted
    pub project_id: Option<Uuid>,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit row recording one status/assignment change
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskHistory {
    /// Unique row ID
    pub id: Uuid,

    /// Task the change applied to
    pub task_id: Uuid,

    /// Actor who made the change
    pub updated_by: Uuid,

    /// Status before the change
    pub old_status: Option<TaskStatus>,

    /// Status after the change
    pub new_status: Option<TaskStatus>,

    /// Assignee before the change
    pub old_assignee: Option<Uuid>,

    /// Assignee after the change
    pub new_assignee: Option<Uuid>,

    /// When the change was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Title, unique within the project
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial assignee, if any
    pub assigned_to: Option<Uuid>,

    /// Project the task belongs to
    pub project_id: Uuid,

    /// Optional due date
    pub due_date: Option<NaiveDate>,
}

/// Partial update; `None` fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New assignee
    pub assigned_to: Option<Uuid>,

    /// New due date
    pub due_date: Option<NaiveDate>,
}

impl Task {
    /// Creates a new task in `Pending` status
    ///
    /// # Errors
    ///
    /// Returns an error if the title already exists in the project (unique
    /// constraint) or a referenced row is missing.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, assigned_to, project_id, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.assigned_to)
        .bind(data.project_id)
        .bind(data.due_date)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a task by title within one project
    pub async fn find_in_project_by_title(
        pool: &PgPool,
        project_id: Uuid,
        title: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 AND title = $2",
        ))
        .bind(project_id)
        .bind(title)
        .fetch_optional(pool)
        .await
    }

    /// Lists all tasks with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts all tasks
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Lists tasks assigned to one user, with pagination
    pub async fn list_by_assignee(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE assigned_to = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts tasks assigned to one user, optionally filtered by status
    ///
    /// The analytics aggregator is built on this query.
    pub async fn count_by_assignee(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<TaskStatus>,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = match status {
            Some(status) => {
                sqlx::query_as(
                    "SELECT COUNT(*) FROM tasks WHERE assigned_to = $1 AND status = $2",
                )
                .bind(user_id)
                .bind(status)
                .fetch_one(pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE assigned_to = $1")
                    .bind(user_id)
                    .fetch_one(pool)
                    .await?
            }
        };

        Ok(count)
    }

    /// Lists tasks inside projects owned by one user, with pagination
    ///
    /// This is the team-leader listing scope.
    pub async fn list_by_project_owner(
        pool: &PgPool,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.assigned_to, t.project_id,
                   t.due_date, t.created_at, t.updated_at
            FROM tasks t
            JOIN projects p ON t.project_id = p.id
            WHERE p.owner_id = $1
            ORDER BY t.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts tasks inside projects owned by one user
    pub async fn count_by_project_owner(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM tasks t
            JOIN projects p ON t.project_id = p.id
            WHERE p.owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Applies a partial update, appending exactly one audit row
    ///
    /// `None` fields in `data` keep the current value. The history row
    /// records the status/assignee before and after the merge; it commits
    /// atomically with the update.
    pub async fn update_with_history(
        pool: &PgPool,
        task: &Task,
        updated_by: Uuid,
        data: UpdateTask,
    ) -> Result<Self, sqlx::Error> {
        let new_title = data.title.unwrap_or_else(|| task.title.clone());
        let new_description = data.description.or_else(|| task.description.clone());
        let new_status = data.status.unwrap_or(task.status);
        let new_assignee = data.assigned_to.or(task.assigned_to);
        let new_due_date = data.due_date.or(task.due_date);

        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO task_history
                (task_id, updated_by, old_status, new_status, old_assignee, new_assignee)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(task.id)
        .bind(updated_by)
        .bind(task.status)
        .bind(new_status)
        .bind(task.assigned_to)
        .bind(new_assignee)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, assigned_to = $5,
                due_date = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task.id)
        .bind(new_title)
        .bind(new_description)
        .bind(new_status)
        .bind(new_assignee)
        .bind(new_due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Assigns the task to a user (or unassigns with `None`)
    ///
    /// Always resets the status to `Pending` and appends exactly one audit
    /// row, atomically.
    pub async fn assign(
        pool: &PgPool,
        task: &Task,
        updated_by: Uuid,
        new_assignee: Option<Uuid>,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO task_history
                (task_id, updated_by, old_status, new_status, old_assignee, new_assignee)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(task.id)
        .bind(updated_by)
        .bind(task.status)
        .bind(TaskStatus::Pending)
        .bind(task.assigned_to)
        .bind(new_assignee)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET assigned_to = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(task.id)
        .bind(new_assignee)
        .bind(TaskStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }
}

impl TaskHistory {
    /// Lists the audit trail for one task, oldest first
    pub async fn for_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskHistory>(
            r#"
            SELECT id, task_id, updated_by, old_status, new_status,
                   old_assignee, new_assignee, recorded_at
            FROM task_history
            WHERE task_id = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Pending).unwrap(),
            "\"Pending\""
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        let parsed: TaskStatus = serde_json::from_str("\"Completed\"").unwrap();
        assert_eq!(parsed, TaskStatus::Completed);
    }

    #[test]
    fn test_status_as_str_matches_serde() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_update_default_is_noop() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.status.is_none());
        assert!(update.assigned_to.is_none());
        assert!(update.due_date.is_none());
    }
}
