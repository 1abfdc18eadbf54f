/// Task endpoints
///
/// - `POST   /tasks/` — create (privileged)
/// - `GET    /tasks/` — role-scoped paginated listing
/// - `GET    /tasks/user-tasks` — tasks assigned to the caller
/// - `GET    /tasks/team-tasks` — team view (privileged)
/// - `PUT    /tasks/{id}` — partial update with audit row
/// - `PUT    /tasks/{id}/assign` — assignment; resets status to Pending
/// - `DELETE /tasks/{id}/archive` — snapshot-then-delete (privileged)
/// - `GET    /tasks/archived` — role-scoped archive listing
/// - `POST   /tasks/{id}/restore` — recreate under the original ID
/// - `GET    /tasks/{id}/history` — audit trail for one task
///
/// Listing scope per role: admin sees everything, a team leader sees tasks
/// in projects they own, a user sees tasks assigned to them.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use taskdeck_shared::auth::policy::{self, ListScope, TaskAction};
use taskdeck_shared::models::archive::ArchivedTask;
use taskdeck_shared::models::project::Project;
use taskdeck_shared::models::task::{CreateTask, Task, TaskHistory, TaskStatus, UpdateTask};
use taskdeck_shared::models::user::User;

use crate::{
    app::AppState,
    error::{validation_failed, ApiError, ApiResult},
    middleware::auth::CurrentUser,
    pagination::PageParams,
};

/// Task shape returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        TaskResponse {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            assigned_to: task.assigned_to,
            project_id: task.project_id,
            due_date: task.due_date,
        }
    }
}

/// Archived-task shape returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedTaskResponse {
    /// Original task ID (also the restore handle)
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assigned_to: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub deleted_by: Uuid,
}

impl From<&ArchivedTask> for ArchivedTaskResponse {
    fn from(archived: &ArchivedTask) -> Self {
        ArchivedTaskResponse {
            id: archived.task_id,
            title: archived.title.clone(),
            description: archived.description.clone(),
            status: archived.status,
            assigned_to: archived.assigned_to,
            project_id: archived.project_id,
            deleted_by: archived.deleted_by,
        }
    }
}

/// Task creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be at most 100 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

/// Assignment request; null unassigns
#[derive(Debug, Deserialize)]
pub struct AssignTaskRequest {
    pub assigned_to: Option<Uuid>,
}

/// `POST /tasks/`
pub async fn create_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Response> {
    policy::require_task(&current.actor(), TaskAction::Create, None)?;

    req.validate().map_err(validation_failed)?;

    let (title, description, project_id) = match (req.title, req.description, req.project_id) {
        (Some(title), Some(description), Some(project_id)) => (title, description, project_id),
        _ => return Err(ApiError::BadRequest("Missing required fields".to_string())),
    };

    if Project::find_by_id(&state.db, project_id).await?.is_none() {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    if Task::find_in_project_by_title(&state.db, project_id, &title)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict {
            field: "title",
            message: "A task with this title already exists in this project".to_string(),
        });
    }

    if let Some(assignee) = req.assigned_to {
        if User::find_by_id(&state.db, assignee).await?.is_none() {
            return Err(ApiError::NotFound("Assignee not found".to_string()));
        }
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            title,
            description: Some(description),
            assigned_to: req.assigned_to,
            project_id,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Task created successfully",
            "task": TaskResponse::from(&task),
        })),
    )
        .into_response())
}

/// Runs the role-scoped task listing and count
async fn scoped_tasks(
    state: &AppState,
    scope: ListScope,
    page: &PageParams,
) -> Result<(Vec<Task>, i64), ApiError> {
    let result = match scope {
        ListScope::All => {
            let tasks = Task::list(&state.db, page.per_page(), page.offset()).await?;
            let total = Task::count(&state.db).await?;
            (tasks, total)
        }
        ListScope::ProjectsOwnedBy(owner_id) => {
            let tasks =
                Task::list_by_project_owner(&state.db, owner_id, page.per_page(), page.offset())
                    .await?;
            let total = Task::count_by_project_owner(&state.db, owner_id).await?;
            (tasks, total)
        }
        ListScope::AssignedTo(user_id) => {
            let tasks =
                Task::list_by_assignee(&state.db, user_id, page.per_page(), page.offset()).await?;
            let total = Task::count_by_assignee(&state.db, user_id, None).await?;
            (tasks, total)
        }
    };

    Ok(result)
}

/// `GET /tasks/`
pub async fn get_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let scope = policy::list_scope(&current.actor());
    let (tasks, total) = scoped_tasks(&state, scope, &page).await?;

    let tasks: Vec<TaskResponse> = tasks.iter().map(TaskResponse::from).collect();

    Ok(Json(json!({
        "tasks": tasks,
        "total": total,
        "pages": page.pages(total),
        "current_page": page.page(),
    })))
}

/// `GET /tasks/user-tasks`
pub async fn get_user_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let (tasks, total) =
        scoped_tasks(&state, ListScope::AssignedTo(current.0.id), &page).await?;

    let tasks: Vec<TaskResponse> = tasks.iter().map(TaskResponse::from).collect();

    Ok(Json(json!({
        "my_tasks": tasks,
        "total": total,
        "pages": page.pages(total),
        "current_page": page.page(),
    })))
}

/// `GET /tasks/team-tasks`
///
/// Privileged view: every task for an admin, owned-project tasks for a
/// team leader.
pub async fn get_team_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<serde_json::Value>> {
    policy::require_team_view(&current.actor())?;

    let (tasks, total) =
        scoped_tasks(&state, policy::list_scope(&current.actor()), &page).await?;

    let tasks: Vec<TaskResponse> = tasks.iter().map(TaskResponse::from).collect();

    Ok(Json(json!({
        "team_tasks": tasks,
        "total": total,
        "pages": page.pages(total),
        "current_page": page.page(),
    })))
}

/// `PUT /tasks/{id}`
///
/// Partial merge, allowed for the assignee or a privileged role; appends
/// one audit row capturing the status/assignee transition.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTask>,
) -> ApiResult<Json<serde_json::Value>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::require_task(&current.actor(), TaskAction::Update, task.assigned_to)?;

    if req.title.is_none()
        && req.description.is_none()
        && req.status.is_none()
        && req.assigned_to.is_none()
        && req.due_date.is_none()
    {
        return Err(ApiError::BadRequest("No update data provided".to_string()));
    }

    if let (Some(ref new_title), Some(project_id)) = (&req.title, task.project_id) {
        if let Some(existing) =
            Task::find_in_project_by_title(&state.db, project_id, new_title).await?
        {
            if existing.id != task.id {
                return Err(ApiError::Conflict {
                    field: "title",
                    message: "A task with this title already exists in this project".to_string(),
                });
            }
        }
    }

    if let Some(assignee) = req.assigned_to {
        if User::find_by_id(&state.db, assignee).await?.is_none() {
            return Err(ApiError::NotFound("Assignee not found".to_string()));
        }
    }

    let updated = Task::update_with_history(&state.db, &task, current.0.id, req).await?;

    Ok(Json(json!({
        "message": "Task updated successfully",
        "task": TaskResponse::from(&updated),
    })))
}

/// `GET /tasks/{id}/history`
///
/// The audit trail, oldest first; visible to the assignee or a privileged
/// role.
pub async fn get_task_history(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::require_task(&current.actor(), TaskAction::ViewHistory, task.assigned_to)?;

    let history = TaskHistory::for_task(&state.db, task.id).await?;

    Ok(Json(json!({ "history": history })))
}

/// `PUT /tasks/{id}/assign`
///
/// Privileged. Writes one audit row and resets the status to Pending,
/// atomically with the assignment.
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AssignTaskRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::require_task(&current.actor(), TaskAction::Assign, task.assigned_to)?;

    if let Some(assignee) = req.assigned_to {
        if User::find_by_id(&state.db, assignee).await?.is_none() {
            return Err(ApiError::NotFound("Assignee not found".to_string()));
        }
    }

    let updated = Task::assign(&state.db, &task, current.0.id, req.assigned_to).await?;

    Ok(Json(json!({
        "message": "Task assigned successfully",
        "task": TaskResponse::from(&updated),
    })))
}

/// `DELETE /tasks/{id}/archive`
///
/// Privileged. The snapshot insert and live-row delete commit together.
pub async fn archive_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::require_task(&current.actor(), TaskAction::Archive, task.assigned_to)?;

    ArchivedTask::archive(&state.db, &task, current.0.id).await?;

    Ok(Json(json!({ "message": "Task archived successfully" })))
}

/// `GET /tasks/archived`
pub async fn get_archived_tasks(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let (archived, total) = match policy::list_scope(&current.actor()) {
        ListScope::All => {
            let rows = ArchivedTask::list(&state.db, page.per_page(), page.offset()).await?;
            let total = ArchivedTask::count(&state.db).await?;
            (rows, total)
        }
        ListScope::ProjectsOwnedBy(owner_id) => {
            let rows = ArchivedTask::list_by_project_owner(
                &state.db,
                owner_id,
                page.per_page(),
                page.offset(),
            )
            .await?;
            let total = ArchivedTask::count_by_project_owner(&state.db, owner_id).await?;
            (rows, total)
        }
        ListScope::AssignedTo(user_id) => {
            let rows =
                ArchivedTask::list_by_assignee(&state.db, user_id, page.per_page(), page.offset())
                    .await?;
            let total = ArchivedTask::count_by_assignee(&state.db, user_id).await?;
            (rows, total)
        }
    };

    let archived: Vec<ArchivedTaskResponse> =
        archived.iter().map(ArchivedTaskResponse::from).collect();

    Ok(Json(json!({
        "archived_tasks": archived,
        "total": total,
        "pages": page.pages(total),
        "current_page": page.page(),
    })))
}

/// `POST /tasks/{id}/restore`
///
/// Privileged. `{id}` is the original task ID shown by the archive
/// listing; the task is recreated under it and the snapshot removed,
/// atomically.
pub async fn restore_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    policy::require_task(&current.actor(), TaskAction::Restore, None)?;

    let archived = ArchivedTask::find_by_task_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Archived task not found".to_string()))?;

    let task = ArchivedTask::restore(&state.db, &archived).await?;

    Ok(Json(json!({
        "message": "Task restored successfully",
        "task": TaskResponse::from(&task),
    })))
}
