/// Database access layer
///
/// - [`pool`]: PostgreSQL connection pool construction and health checks
/// - [`migrations`]: schema migration runner applied at startup

pub mod migrations;
pub mod pool;
