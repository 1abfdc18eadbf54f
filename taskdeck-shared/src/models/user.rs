/// User model and database operations
///
/// Users are the account and identity entity: authentication state (password
/// hash, transient OTP), the role driving authorization, and profile fields.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'team_leader', 'user');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(80) NOT NULL UNIQUE,
///     email VARCHAR(120) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     otp VARCHAR(6),
///     otp_expires_at TIMESTAMPTZ,
///     role user_role NOT NULL DEFAULT 'user',
///     phone VARCHAR(20),
///     location VARCHAR(100),
///     gender VARCHAR(10),
///     primary_email VARCHAR(120),
///     verified BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::user::{CreateUser, User, UserRole};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         username: "alice".to_string(),
///         email: "alice@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///         role: UserRole::User,
///         otp: None,
///         otp_expires_at: None,
///     },
/// )
/// .await?;
///
/// let found = User::find_by_email(&pool, "alice@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Columns selected for every `User` read, kept in one place so the
/// RETURNING clauses stay in sync with the struct.
const USER_COLUMNS: &str = "id, username, email, password_hash, otp, otp_expires_at, role, \
     phone, location, gender, primary_email, verified, created_at, updated_at";

/// Account role driving the authorization policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full control over every resource
    Admin,

    /// Manages projects and tasks for their team
    TeamLeader,

    /// Regular account; operates on resources assigned to them
    User,
}

impl UserRole {
    /// Role name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::TeamLeader => "team_leader",
            UserRole::User => "user",
        }
    }
}

/// User model representing an account
///
/// The password hash and OTP never serialize into API responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Unique username
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id password hash, never plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Current one-time password, if one is outstanding
    ///
    /// Overwritten on every issuance, cleared on successful verification.
    #[serde(skip_serializing)]
    pub otp: Option<String>,

    /// When the outstanding OTP stops being accepted
    #[serde(skip_serializing)]
    pub otp_expires_at: Option<DateTime<Utc>>,

    /// Account role
    pub role: UserRole,

    /// Optional phone number
    pub phone: Option<String>,

    /// Optional location
    pub location: Option<String>,

    /// Optional gender
    pub gender: Option<String>,

    /// Optional secondary contact email
    pub primary_email: Option<String>,

    /// Whether the account completed OTP verification at least once
    pub verified: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Unique username
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,

    /// Initial role
    pub role: UserRole,

    /// OTP issued at registration time, if any
    pub otp: Option<String>,

    /// Expiry of the registration OTP
    pub otp_expires_at: Option<DateTime<Utc>>,
}

/// Partial update of a user's own profile fields
///
/// Only `Some` fields overwrite; everything else is left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    /// New phone number
    pub phone: Option<String>,

    /// New location
    pub location: Option<String>,

    /// New gender
    pub gender: Option<String>,

    /// New secondary contact email
    pub primary_email: Option<String>,
}

/// Privileged edit of another user's account
///
/// All fields optional; only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdateUser {
    /// New username
    pub username: Option<String>,

    /// New email address
    pub email: Option<String>,

    /// New role
    pub role: Option<UserRole>,

    /// New phone number
    pub phone: Option<String>,

    /// New location
    pub location: Option<String>,

    /// New gender
    pub gender: Option<String>,

    /// New secondary contact email
    pub primary_email: Option<String>,

    /// Override the verified flag
    pub verified: Option<bool>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email already exists (unique
    /// constraint violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role, otp, otp_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.otp)
        .bind(data.otp_expires_at)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1",
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial profile update to the caller's own account
    ///
    /// Fields left as `None` keep their current value.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET phone = COALESCE($2, phone),
                location = COALESCE($3, location),
                gender = COALESCE($4, gender),
                primary_email = COALESCE($5, primary_email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.phone)
        .bind(data.location)
        .bind(data.gender)
        .bind(data.primary_email)
        .fetch_optional(pool)
        .await
    }

    /// Privileged edit of another user's account
    ///
    /// Builds the UPDATE dynamically so only provided fields are written.
    ///
    /// # Errors
    ///
    /// Returns an error if a new username/email collides with an existing
    /// account, or the database fails.
    pub async fn admin_update(
        pool: &PgPool,
        id: Uuid,
        data: AdminUpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }
        if data.phone.is_some() {
            bind_count += 1;
            query.push_str(&format!(", phone = ${}", bind_count));
        }
        if data.location.is_some() {
            bind_count += 1;
            query.push_str(&format!(", location = ${}", bind_count));
        }
        if data.gender.is_some() {
            bind_count += 1;
            query.push_str(&format!(", gender = ${}", bind_count));
        }
        if data.primary_email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", primary_email = ${}", bind_count));
        }
        if data.verified.is_some() {
            bind_count += 1;
            query.push_str(&format!(", verified = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }
        if let Some(phone) = data.phone {
            q = q.bind(phone);
        }
        if let Some(location) = data.location {
            q = q.bind(location);
        }
        if let Some(gender) = data.gender {
            q = q.bind(gender);
        }
        if let Some(primary_email) = data.primary_email {
            q = q.bind(primary_email);
        }
        if let Some(verified) = data.verified {
            q = q.bind(verified);
        }

        q.fetch_optional(pool).await
    }

    /// Replaces the stored password hash
    pub async fn set_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores a freshly issued OTP, overwriting any outstanding one
    pub async fn set_otp(
        pool: &PgPool,
        id: Uuid,
        otp: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET otp = $2, otp_expires_at = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(otp)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Consumes the outstanding OTP after a successful verification
    ///
    /// Clears the code so it cannot be replayed, and marks the account
    /// verified.
    pub async fn consume_otp(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET otp = NULL, otp_expires_at = NULL, verified = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users with pagination, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Lists every user, for the team analytics view
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC",
        ))
        .fetch_all(pool)
        .await
    }

    /// Counts all users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Deletes a user, cascading ownership in one transaction
    ///
    /// Projects owned by the deleted user are reassigned to `reassign_to`
    /// (the deleting actor) and their task assignments are nulled, so no
    /// `owner_id` is ever left dangling. When a user deletes themself their
    /// owned projects are deleted instead, since there is nobody left to
    /// reassign to.
    ///
    /// # Returns
    ///
    /// True if the user existed and was deleted.
    pub async fn delete_cascade(
        pool: &PgPool,
        id: Uuid,
        reassign_to: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if reassign_to == id {
            sqlx::query("DELETE FROM projects WHERE owner_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query(
                "UPDATE projects SET owner_id = $2, updated_at = NOW() WHERE owner_id = $1",
            )
            .bind(id)
            .bind(reassign_to)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE tasks SET assigned_to = NULL, updated_at = NOW() WHERE assigned_to = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::TeamLeader.as_str(), "team_leader");
        assert_eq!(UserRole::User.as_str(), "user");
    }

    #[test]
    fn test_role_serde_wire_format() {
        assert_eq!(
            serde_json::to_string(&UserRole::TeamLeader).unwrap(),
            "\"team_leader\""
        );
        let parsed: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, UserRole::Admin);
    }

    #[test]
    fn test_update_profile_default_is_noop() {
        let update = UpdateProfile::default();
        assert!(update.phone.is_none());
        assert!(update.location.is_none());
        assert!(update.gender.is_none());
        assert!(update.primary_email.is_none());
    }

    #[test]
    fn test_admin_update_default_is_noop() {
        let update = AdminUpdateUser::default();
        assert!(update.username.is_none());
        assert!(update.email.is_none());
        assert!(update.role.is_none());
        assert!(update.verified.is_none());
    }

    // Database-backed tests for the CRUD paths require a running Postgres
    // and live with the deployment environment, not in this crate.
}
