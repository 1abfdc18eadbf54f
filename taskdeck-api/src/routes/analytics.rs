/// Analytics endpoints
///
/// Pure read-side aggregation over the task store:
///
/// - `GET /analytics/user` — the caller's own counts and productivity
/// - `GET /analytics/team-leader` — one record per user (privileged)
///
/// `productivity_percentage` is completed/total × 100, rounded to two
/// decimals, and defined as 0 for a user with no tasks.

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use taskdeck_shared::auth::policy;
use taskdeck_shared::models::task::{Task, TaskStatus};
use taskdeck_shared::models::user::User;

use crate::{app::AppState, error::ApiResult, middleware::auth::CurrentUser};

/// Per-user analytics record
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub user_id: Uuid,
    pub username: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub productivity_percentage: f64,
}

/// Completed share of total, as a percentage rounded to 2 decimals
///
/// Zero total is defined as zero productivity, never a division error.
fn productivity_percentage(completed: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let pct = completed as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

async fn stats_for(state: &AppState, user: &User) -> Result<UserStats, sqlx::Error> {
    let total = Task::count_by_assignee(&state.db, user.id, None).await?;
    let completed =
        Task::count_by_assignee(&state.db, user.id, Some(TaskStatus::Completed)).await?;
    let pending = Task::count_by_assignee(&state.db, user.id, Some(TaskStatus::Pending)).await?;

    Ok(UserStats {
        user_id: user.id,
        username: user.username.clone(),
        total_tasks: total,
        completed_tasks: completed,
        pending_tasks: pending,
        productivity_percentage: productivity_percentage(completed, total),
    })
}

/// `GET /analytics/user`
pub async fn user_analytics(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<serde_json::Value>> {
    let stats = stats_for(&state, &current.0).await?;

    Ok(Json(json!({ "analytics": stats })))
}

/// `GET /analytics/team-leader`
///
/// One record per user in the system; admin/team_leader only.
pub async fn team_analytics(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<serde_json::Value>> {
    policy::require_team_view(&current.actor())?;

    let users = User::list_all(&state.db).await?;

    let mut stats = Vec::with_capacity(users.len());
    for user in &users {
        stats.push(stats_for(&state, user).await?);
    }

    Ok(Json(json!({ "analytics": stats })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_is_zero_productivity() {
        assert_eq!(productivity_percentage(0, 0), 0.0);
        // Nonsense input (completed without total) still must not divide.
        assert_eq!(productivity_percentage(5, 0), 0.0);
    }

    #[test]
    fn test_productivity_rounds_to_two_decimals() {
        assert_eq!(productivity_percentage(1, 3), 33.33);
        assert_eq!(productivity_percentage(2, 3), 66.67);
        assert_eq!(productivity_percentage(1, 1), 100.0);
        assert_eq!(productivity_percentage(1, 8), 12.5);
    }

    #[test]
    fn test_stats_serialization_shape() {
        let stats = UserStats {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            total_tasks: 4,
            completed_tasks: 1,
            pending_tasks: 3,
            productivity_percentage: 25.0,
        };

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["total_tasks"], 4);
        assert_eq!(value["productivity_percentage"], 25.0);
    }
}
