/// API route handlers, organized by resource
///
/// - `health`: liveness probe
/// - `auth`: registration, login, OTP, password reset, refresh
/// - `users`: profiles, account management, newsletter
/// - `projects`: project CRUD and ownership reassignment
/// - `tasks`: task CRUD, assignment, archive/restore
/// - `analytics`: per-user and team productivity stats

pub mod analytics;
pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
