/// User directory endpoints
///
/// - `GET    /user/profile` — caller's profile
/// - `PUT    /user/update-profile` — partial update of own profile fields
/// - `GET    /user/profiles` — paginated profile listing
/// - `POST   /user/subscribe` — newsletter opt-in (public)
/// - `POST   /user/create-user` — privileged teammate creation
/// - `DELETE /user/{id}` — delete with cascade reassignment
/// - `PUT    /user/updates-profile/{id}` — privileged account edit
/// - `PUT    /user/change-password/{id}` — privileged password change

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::ValidateEmail;

use taskdeck_shared::auth::{
    password,
    policy::{self, UserAction},
};
use taskdeck_shared::mail::Notification;
use taskdeck_shared::models::subscriber::Subscriber;
use taskdeck_shared::models::user::{AdminUpdateUser, CreateUser, UpdateProfile, User, UserRole};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::CurrentUser,
    pagination::PageParams,
};

/// Profile shape returned to clients (no credential material)
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub gender: Option<String>,
    pub primary_email: Option<String>,
    pub verified: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            phone: user.phone.clone(),
            location: user.location.clone(),
            gender: user.gender.clone(),
            primary_email: user.primary_email.clone(),
            verified: user.verified,
        }
    }
}

/// Newsletter subscription request
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

/// Teammate creation request
#[derive(Debug, Deserialize)]
pub struct CreateTeamMemberRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    /// Initial password; generated when absent
    pub password: Option<String>,
    /// Role for the new account (default: user)
    pub role: Option<UserRole>,
}

/// Password change request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: Option<String>,
}

/// `GET /user/profile`
pub async fn get_profile(
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<serde_json::Value>> {
    Ok(Json(json!({ "user": UserProfile::from(&current.0) })))
}

/// `PUT /user/update-profile`
///
/// Partial merge: only provided fields overwrite.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<UpdateProfile>,
) -> ApiResult<Json<serde_json::Value>> {
    let updated = User::update_profile(&state.db, current.0.id, req)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": UserProfile::from(&updated),
    })))
}

/// `GET /user/profiles`
pub async fn get_profiles(
    State(state): State<AppState>,
    Extension(_current): Extension<CurrentUser>,
    Query(page): Query<PageParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let users = User::list(&state.db, page.per_page(), page.offset()).await?;
    let total = User::count(&state.db).await?;

    let profiles: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();

    Ok(Json(json!({
        "users": profiles,
        "total": total,
        "pages": page.pages(total),
        "current_page": page.page(),
    })))
}

/// `POST /user/subscribe`
///
/// Public endpoint; the subscriber list is independent of accounts.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> ApiResult<Response> {
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::field("email", "email is required"))?;

    if !email.validate_email() {
        return Err(ApiError::field("email", "Invalid email format"));
    }

    if Subscriber::find_by_email(&state.db, email).await?.is_some() {
        return Err(ApiError::Conflict {
            field: "email",
            message: "Email already subscribed".to_string(),
        });
    }

    Subscriber::create(&state.db, email).await?;

    state.mailer.send(Notification::SubscriptionConfirmed {
        to: email.to_string(),
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Subscribed successfully" })),
    )
        .into_response())
}

/// `POST /user/create-user`
///
/// Privileged teammate creation. When no password is supplied one is
/// generated; either way the invite email carries the initial credentials.
pub async fn create_team_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateTeamMemberRequest>,
) -> ApiResult<Response> {
    policy::require_user(&current.actor(), UserAction::CreateTeammate, current.0.id)?;

    let username = req
        .username
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::field("username", "username is required"))?;
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::field("email", "email is required"))?;

    if !email.validate_email() {
        return Err(ApiError::field("email", "Invalid email format"));
    }

    if User::find_by_username(&state.db, username).await?.is_some() {
        return Err(ApiError::field("username", "Username already exists"));
    }
    if User::find_by_email(&state.db, email).await?.is_some() {
        return Err(ApiError::field("email", "Email already exists"));
    }

    let initial_password = match req.password {
        Some(ref password) if !password.is_empty() => {
            password::validate_password(password)
                .map_err(|msg| ApiError::field("password", msg))?;
            password.clone()
        }
        _ => generate_password(),
    };

    let password_hash = password::hash_password(&initial_password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role: req.role.unwrap_or(UserRole::User),
            otp: None,
            otp_expires_at: None,
        },
    )
    .await?;

    state.mailer.send(Notification::TeammateInvite {
        to: user.email.clone(),
        username: user.username.clone(),
        password: initial_password,
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Team member created successfully",
            "user": UserProfile::from(&user),
        })),
    )
        .into_response())
}

/// `DELETE /user/{id}`
///
/// Allowed for admin, team_leader, or the user themself. Owned projects
/// move to the deleting actor and task assignments are nulled, in one
/// transaction.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    policy::require_user(&current.actor(), UserAction::Delete, user_id)?;

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    User::delete_cascade(&state.db, user_id, current.0.id).await?;

    Ok(Json(json!({ "message": "User deleted successfully" })))
}

/// `PUT /user/updates-profile/{id}`
///
/// Privileged partial edit of another user's account, role included.
pub async fn admin_update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AdminUpdateUser>,
) -> ApiResult<Json<serde_json::Value>> {
    policy::require_user(&current.actor(), UserAction::EditAccount, user_id)?;

    if let Some(ref email) = req.email {
        if !email.validate_email() {
            return Err(ApiError::field("email", "Invalid email format"));
        }
    }

    let updated = User::admin_update(&state.db, user_id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": UserProfile::from(&updated),
    })))
}

/// `PUT /user/change-password/{id}`
pub async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    policy::require_user(&current.actor(), UserAction::ChangePassword, user_id)?;

    let new_password = req
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::field("password", "password is required"))?;

    password::validate_password(new_password)
        .map_err(|msg| ApiError::field("password", msg))?;

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let password_hash = password::hash_password(new_password)?;
    User::set_password(&state.db, user_id, &password_hash).await?;

    Ok(Json(json!({
        "message": "Password has been updated successfully"
    })))
}

/// Random initial password for generated teammate accounts
///
/// 12 alphanumeric characters, inside the accepted [8, 20] window.
fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_is_valid() {
        for _ in 0..20 {
            let password = generate_password();
            assert_eq!(password.len(), 12);
            assert!(password::validate_password(&password).is_ok());
            assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_profile_serialization_omits_credentials() {
        let profile = UserProfile {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            role: UserRole::User,
            phone: None,
            location: None,
            gender: None,
            primary_email: None,
            verified: false,
        };

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["username"], "alice");
        assert_eq!(value["role"], "user");
        assert!(value.get("password_hash").is_none());
        assert!(value.get("otp").is_none());
    }
}
