/// Project endpoints
///
/// - `POST   /projects/` — create (privileged)
/// - `GET    /projects/` — paginated listing
/// - `GET    /projects/user` — caller's projects
/// - `PUT    /projects/{id}` — partial update (owner or privileged)
/// - `DELETE /projects/{id}` — hard delete (privileged)
/// - `PUT    /projects/{id}/assign` — ownership transfer with audit row
/// - `GET    /projects/{id}/history` — reassignment audit trail

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use taskdeck_shared::auth::policy::{self, ProjectAction};
use taskdeck_shared::models::project::{
    CreateProject, Project, ProjectHistory, ProjectPriority, ProjectStatus, UpdateProject,
};
use taskdeck_shared::models::user::User;

use crate::{
    app::AppState,
    error::{validation_failed, ApiError, ApiResult},
    middleware::auth::CurrentUser,
    pagination::PageParams,
};

/// Project shape returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub status: ProjectStatus,
    pub priority: Option<ProjectPriority>,
}

impl From<&Project> for ProjectResponse {
    fn from(project: &Project) -> Self {
        ProjectResponse {
            id: project.id,
            name: project.name.clone(),
            description: project.description.clone(),
            owner_id: project.owner_id,
            status: project.status,
            priority: project.priority,
        }
    }
}

/// Project creation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<ProjectPriority>,
}

/// Ownership transfer request
#[derive(Debug, Deserialize)]
pub struct AssignProjectRequest {
    pub assigned_to: Option<Uuid>,
}

/// `POST /projects/`
pub async fn create_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Response> {
    policy::require_project(&current.actor(), ProjectAction::Create, None)?;

    req.validate().map_err(validation_failed)?;

    let (name, description) = match (req.name, req.description) {
        (Some(name), Some(description)) => (name, description),
        _ => return Err(ApiError::BadRequest("Missing required fields".to_string())),
    };

    if Project::find_by_name(&state.db, &name).await?.is_some() {
        return Err(ApiError::Conflict {
            field: "name",
            message: "Project name already exists".to_string(),
        });
    }

    let project = Project::create(
        &state.db,
        CreateProject {
            name,
            description: Some(description),
            owner_id: current.0.id,
            priority: req.priority,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Project created successfully",
            "project": ProjectResponse::from(&project),
        })),
    )
        .into_response())
}

/// `GET /projects/`
pub async fn get_projects(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let projects = Project::list(&state.db, page.per_page(), page.offset()).await?;
    let total = Project::count(&state.db).await?;

    let projects: Vec<ProjectResponse> = projects.iter().map(ProjectResponse::from).collect();

    Ok(Json(json!({
        "projects": projects,
        "total": total,
        "pages": page.pages(total),
        "current_page": page.page(),
    })))
}

/// `GET /projects/user`
pub async fn get_user_projects(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let projects =
        Project::list_by_owner(&state.db, current.0.id, page.per_page(), page.offset()).await?;
    let total = Project::count_by_owner(&state.db, current.0.id).await?;

    let projects: Vec<ProjectResponse> = projects.iter().map(ProjectResponse::from).collect();

    Ok(Json(json!({
        "my_projects": projects,
        "total": total,
        "pages": page.pages(total),
        "current_page": page.page(),
    })))
}

/// `PUT /projects/{id}`
///
/// Partial merge, allowed for the owner or a privileged role.
pub async fn update_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProject>,
) -> ApiResult<Json<serde_json::Value>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    policy::require_project(
        &current.actor(),
        ProjectAction::Update,
        Some(project.owner_id),
    )?;

    if let Some(ref new_name) = req.name {
        if let Some(existing) = Project::find_by_name(&state.db, new_name).await? {
            if existing.id != project.id {
                return Err(ApiError::Conflict {
                    field: "name",
                    message: "Project name already exists".to_string(),
                });
            }
        }
    }

    let updated = Project::update(&state.db, project.id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(json!({
        "message": "Project updated successfully",
        "project": ProjectResponse::from(&updated),
    })))
}

/// `DELETE /projects/{id}`
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    policy::require_project(
        &current.actor(),
        ProjectAction::Delete,
        Some(project.owner_id),
    )?;

    Project::delete(&state.db, project.id).await?;

    Ok(Json(json!({ "message": "Project deleted successfully" })))
}

/// `GET /projects/{id}/history`
///
/// The reassignment audit trail, oldest first; visible to the owner or a
/// privileged role.
pub async fn get_project_history(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    policy::require_project(
        &current.actor(),
        ProjectAction::ViewHistory,
        Some(project.owner_id),
    )?;

    let history = ProjectHistory::for_project(&state.db, project.id).await?;

    Ok(Json(json!({ "history": history })))
}

/// `PUT /projects/{id}/assign`
///
/// Transfers ownership and appends exactly one history row, atomically.
pub async fn assign_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AssignProjectRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let project = Project::find_by_id(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    policy::require_project(
        &current.actor(),
        ProjectAction::Reassign,
        Some(project.owner_id),
    )?;

    let new_owner_id = req
        .assigned_to
        .ok_or_else(|| ApiError::BadRequest("New owner ID is required".to_string()))?;

    if User::find_by_id(&state.db, new_owner_id).await?.is_none() {
        return Err(ApiError::NotFound("New owner not found".to_string()));
    }

    let updated = Project::reassign(&state.db, &project, current.0.id, new_owner_id).await?;

    Ok(Json(json!({
        "message": "Project assigned successfully",
        "project": ProjectResponse::from(&updated),
    })))
}
