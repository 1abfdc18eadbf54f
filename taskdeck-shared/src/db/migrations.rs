/// Database migration runner
///
/// Applies the SQL migrations in the workspace-level `migrations/`
/// directory. The API server runs this once at startup so the schema —
/// including the uniqueness constraints the registration and task/project
/// creation paths rely on — is in place before the first request.

use sqlx::PgPool;
use tracing::info;

/// Runs all pending database migrations
///
/// Already-applied migrations are skipped; a failed migration is rolled
/// back and returned as an error.
///
/// # Errors
///
/// Returns an error if a migration file is malformed or fails to execute.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");
    sqlx::migrate!("../migrations").run(pool).await?;
    info!("Database migrations up to date");
    Ok(())
}
