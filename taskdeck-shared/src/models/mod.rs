/// Database models for TaskDeck
///
/// Every model owns its CRUD operations against the shared `PgPool`; the
/// multi-statement mutations (cascading user deletion, assignment with
/// history, archive/restore) run inside a single transaction.
///
/// # Models
///
/// - `user`: accounts, roles, OTP state, profile fields
/// - `project`: projects, ownership, reassignment history
/// - `task`: tasks, assignment, status history
/// - `archive`: archived task snapshots and restore
/// - `subscriber`: newsletter opt-in list

pub mod archive;
pub mod project;
pub mod subscriber;
pub mod task;
pub mod user;
