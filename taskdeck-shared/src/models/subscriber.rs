/// Newsletter subscribers
///
/// An opt-in email list, deliberately independent of user accounts: anyone
/// may subscribe, and deleting an account does not touch the list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Subscriber row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscriber {
    /// Unique subscriber ID
    pub id: Uuid,

    /// Unique email address
    pub email: String,

    /// When the subscription was created
    pub created_at: DateTime<Utc>,
}

impl Subscriber {
    /// Adds an email to the list
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already subscribed (unique
    /// constraint).
    pub async fn create(pool: &PgPool, email: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Subscriber>(
            r#"
            INSERT INTO subscribers (email)
            VALUES ($1)
            RETURNING id, email, created_at
            "#,
        )
        .bind(email)
        .fetch_one(pool)
        .await
    }

    /// Looks up a subscription by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscriber>(
            "SELECT id, email, created_at FROM subscribers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }
}
