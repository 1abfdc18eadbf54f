/// Project model, ownership reassignment, and audit history
///
/// Projects group tasks under a single owner. Ownership transfers are the
/// audited mutation: every reassignment appends exactly one
/// [`ProjectHistory`] row in the same transaction that moves the owner.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('pending', 'active', 'completed');
/// CREATE TYPE project_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL UNIQUE,
///     description TEXT,
///     owner_id UUID NOT NULL REFERENCES users(id),
///     status project_status NOT NULL DEFAULT 'pending',
///     priority project_priority,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `project_history` is append-only and carries no foreign keys: rows are
/// an immutable log and outlive the entities they mention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const PROJECT_COLUMNS: &str =
    "id, name, description, owner_id, status, priority, created_at, updated_at";

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Not yet started (the default for new projects)
    #[serde(rename = "Pending")]
    Pending,

    /// Work in progress
    #[serde(rename = "Active")]
    Active,

    /// Finished
    #[serde(rename = "Completed")]
    Completed,
}

/// Project priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_priority", rename_all = "snake_case")]
pub enum ProjectPriority {
    #[serde(rename = "Low")]
    Low,

    #[serde(rename = "Medium")]
    Medium,

    #[serde(rename = "High")]
    High,
}

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Globally unique project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning user; must always reference an existing user
    pub owner_id: Uuid,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// Optional priority
    pub priority: Option<ProjectPriority>,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit row recording one ownership reassignment
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectHistory {
    /// Unique row ID
    pub id: Uuid,

    /// Project the reassignment applied to
    pub project_id: Uuid,

    /// Actor who performed the reassignment
    pub updated_by: Uuid,

    /// Owner before the change
    pub old_owner: Option<Uuid>,

    /// Owner after the change
    pub new_owner: Option<Uuid>,

    /// Status before the change
    pub old_status: Option<ProjectStatus>,

    /// Status after the change
    pub new_status: Option<ProjectStatus>,

    /// When the change was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// Globally unique name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Owning user
    pub owner_id: Uuid,

    /// Optional priority
    pub priority: Option<ProjectPriority>,
}

/// Partial update; `None` fields keep their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<ProjectStatus>,

    /// New priority
    pub priority: Option<ProjectPriority>,
}

impl Project {
    /// Creates a new project in `Pending` status
    ///
    /// # Errors
    ///
    /// Returns an error if the name already exists (unique constraint) or
    /// the owner does not reference an existing user.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (name, description, owner_id, priority)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .bind(data.priority)
        .fetch_one(pool)
        .await
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a project by its unique name
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE name = $1",
        ))
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Lists projects with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Lists projects owned by one user, with pagination
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Counts all projects
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Counts projects owned by one user
    pub async fn count_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM projects WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Applies a partial update
    ///
    /// Ownership is never changed here; use [`Project::reassign`] so the
    /// transfer is audited.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .fetch_optional(pool)
        .await
    }

    /// Hard-deletes a project
    ///
    /// Tasks that referenced it keep existing with a null `project_id`
    /// (`ON DELETE SET NULL`); history rows are retained untouched.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Transfers ownership, appending exactly one audit row
    ///
    /// The history insert and the owner update commit atomically; a failure
    /// in either rolls both back.
    pub async fn reassign(
        pool: &PgPool,
        project: &Project,
        updated_by: Uuid,
        new_owner: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO project_history
                (project_id, updated_by, old_owner, new_owner, old_status, new_status)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(project.id)
        .bind(updated_by)
        .bind(project.owner_id)
        .bind(new_owner)
        .bind(project.status)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET owner_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(project.id)
        .bind(new_owner)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }
}

impl ProjectHistory {
    /// Lists the audit trail for one project, oldest first
    pub async fn for_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectHistory>(
            r#"
            SELECT id, project_id, updated_by, old_owner, new_owner,
                   old_status, new_status, recorded_at
            FROM project_history
            WHERE project_id = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(project_id)
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
            serde_json::to_string(&ProjectStatus::Pending).unwrap(),
            "\"Pending\""
        );
        assert_eq!(
            serde_json::to_string(&ProjectStatus::Active).unwrap(),
            "\"Active\""
        );
        let parsed: ProjectStatus = serde_json::from_str("\"Completed\"").unwrap();
        assert_eq!(parsed, ProjectStatus::Completed);
    }

    #[test]
    fn test_priority_wire_format() {
        assert_eq!(
            serde_json::to_string(&ProjectPriority::High).unwrap(),
            "\"High\""
        );
        let parsed: ProjectPriority = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(parsed, ProjectPriority::Low);
    }

    #[test]
    fn test_update_default_is_noop() {
        let update = UpdateProject::default();
        assert!(update.name.is_none());
        assert!(update.description.is_none());
        assert!(update.status.is_none());
        assert!(update.priority.is_none());
    }
}
