/// Authentication endpoints
///
/// - `POST /auth/register` — create an account, issue OTP + tokens
/// - `POST /auth/login` — password check, fresh OTP, tokens
/// - `GET  /auth/logout` — clear token cookies
/// - `POST /auth/send-otp` — re-issue an OTP
/// - `POST /auth/verify-otp` — verify the OTP, mark account verified
/// - `POST /auth/forgot-password` — email a reset link
/// - `POST /auth/reset-password` — set a new password from a reset token
/// - `POST /auth/refresh` — exchange a refresh token for an access token
///
/// Tokens are returned in the JSON body and mirrored into http-only
/// cookies; password verification is followed by immediate token issuance,
/// with OTP verification flipping the `verified` flag.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::ValidateEmail;

use taskdeck_shared::auth::{jwt, otp, password};
use taskdeck_shared::mail::Notification;
use taskdeck_shared::models::user::{CreateUser, User, UserRole};

use crate::{
    app::AppState,
    cookies,
    error::{ApiError, ApiResult},
    routes::users::UserProfile,
};

/// Register request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Email-only request (send-otp, forgot-password)
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: Option<String>,
}

/// OTP verification request
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

/// Password reset request
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

/// Refresh request; the token may also arrive via header or cookie
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Creates the access/refresh pair for a user
fn issue_tokens(state: &AppState, user_id: Uuid) -> Result<(String, String), ApiError> {
    let access = jwt::create_token(
        &jwt::Claims::new(user_id, jwt::TokenType::Access),
        state.jwt_secret(),
    )
    .map_err(|e| ApiError::Internal(format!("Token generation failed: {}", e)))?;

    let refresh = jwt::create_token(
        &jwt::Claims::new(user_id, jwt::TokenType::Refresh),
        state.jwt_secret(),
    )
    .map_err(|e| ApiError::Internal(format!("Token generation failed: {}", e)))?;

    Ok((access, refresh))
}

/// JSON body plus both token cookies
fn token_response(
    state: &AppState,
    body: serde_json::Value,
    access: &str,
    refresh: &str,
) -> Response {
    let secure = state.secure_cookies();
    (
        StatusCode::OK,
        AppendHeaders([
            (header::SET_COOKIE, cookies::access_cookie(access, secure)),
            (header::SET_COOKIE, cookies::refresh_cookie(refresh, secure)),
        ]),
        Json(body),
    )
        .into_response()
}

fn require_field<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ApiError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::field(field, format!("{} is required", field))),
    }
}

/// Issues and stores a fresh OTP, then emails it
///
/// State commits before the notification is enqueued; a mail failure can
/// never roll back the stored code.
async fn issue_otp(state: &AppState, user: &User) -> Result<(), ApiError> {
    let code = otp::generate();
    User::set_otp(&state.db, user.id, &code, otp::expiry_from_now()).await?;

    state.mailer.send(Notification::Otp {
        to: user.email.clone(),
        code,
    });

    Ok(())
}

/// `POST /auth/register`
///
/// Validates field presence, email format, username/email uniqueness,
/// password length, and confirmation; then persists the account, issues an
/// OTP, and responds with the profile plus both tokens.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Response> {
    let username = require_field(&req.username, "username")?;
    let email = require_field(&req.email, "email")?;
    let pass = require_field(&req.password, "password")?;
    let confirm = require_field(&req.confirm_password, "confirmPassword")?;

    if !email.validate_email() {
        return Err(ApiError::field("email", "Invalid email format"));
    }

    if User::find_by_username(&state.db, username).await?.is_some() {
        return Err(ApiError::field("username", "Username already exists"));
    }
    if User::find_by_email(&state.db, email).await?.is_some() {
        return Err(ApiError::field("email", "Email already exists"));
    }

    password::validate_password(pass).map_err(|msg| ApiError::field("password", msg))?;

    if pass != confirm {
        return Err(ApiError::field("confirmPassword", "Passwords do not match"));
    }

    let password_hash = password::hash_password(pass)?;
    let code = otp::generate();

    // The OTP rides along in the INSERT, so account and code commit
    // atomically; the unique constraints catch registration races the
    // pre-checks above let through.
    let user = User::create(
        &state.db,
        CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role: UserRole::User,
            otp: Some(code.clone()),
            otp_expires_at: Some(otp::expiry_from_now()),
        },
    )
    .await?;

    state.mailer.send(Notification::Otp {
        to: user.email.clone(),
        code,
    });
    state.mailer.send(Notification::Welcome {
        to: user.email.clone(),
        username: user.username.clone(),
    });

    let (access, refresh) = issue_tokens(&state, user.id)?;

    Ok(token_response(
        &state,
        json!({
            "message": "User registered successfully",
            "access_token": access,
            "refresh_token": refresh,
            "user": UserProfile::from(&user),
        }),
        &access,
        &refresh,
    ))
}

/// `POST /auth/login`
///
/// Verifies the password, then stores and emails a fresh OTP. Tokens are
/// issued immediately; OTP verification afterwards marks the account
/// verified.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Response> {
    let email = require_field(&req.email, "email")?;
    let pass = require_field(&req.password, "password")?;

    let user = match User::find_by_email(&state.db, email).await? {
        Some(user) => {
            if !password::verify_password(pass, &user.password_hash)? {
                return Err(ApiError::BadRequest("Invalid credentials".to_string()));
            }
            user
        }
        None => return Err(ApiError::BadRequest("Invalid credentials".to_string())),
    };

    issue_otp(&state, &user).await?;

    let (access, refresh) = issue_tokens(&state, user.id)?;

    Ok(token_response(
        &state,
        json!({
            "message": "OTP sent",
            "access_token": access,
            "refresh_token": refresh,
            "user": UserProfile::from(&user),
        }),
        &access,
        &refresh,
    ))
}

/// `GET /auth/logout`
///
/// Stateless: only the cookies are cleared, nothing is revoked server-side.
pub async fn logout(State(state): State<AppState>) -> Response {
    let secure = state.secure_cookies();
    (
        StatusCode::OK,
        AppendHeaders([
            (
                header::SET_COOKIE,
                cookies::clear_cookie(cookies::ACCESS_COOKIE, secure),
            ),
            (
                header::SET_COOKIE,
                cookies::clear_cookie(cookies::REFRESH_COOKIE, secure),
            ),
        ]),
        Json(json!({ "message": "Successfully logged out" })),
    )
        .into_response()
}

/// `POST /auth/send-otp`
pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;

    let user = User::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    issue_otp(&state, &user).await?;

    Ok(Json(json!({ "message": "OTP sent successfully" })))
}

/// `POST /auth/verify-otp`
///
/// Exact match against the stored code, which must still be inside its
/// validity window. A successful verification consumes the code — replaying
/// it fails — and marks the account verified.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> ApiResult<Response> {
    let email = require_field(&req.email, "email")?;
    let code = require_field(&req.otp, "otp")?;

    let user = match User::find_by_email(&state.db, email).await? {
        Some(user) => user,
        None => return Err(ApiError::BadRequest("Invalid OTP".to_string())),
    };

    if user.otp.as_deref() != Some(code) || !otp::is_live(user.otp_expires_at) {
        return Err(ApiError::BadRequest("Invalid OTP".to_string()));
    }

    User::consume_otp(&state.db, user.id).await?;

    let (access, refresh) = issue_tokens(&state, user.id)?;

    Ok(token_response(
        &state,
        json!({
            "message": "Verification success",
            "role": user.role,
            "access_token": access,
            "refresh_token": refresh,
        }),
        &access,
        &refresh,
    ))
}

/// `POST /auth/forgot-password`
///
/// Emails a link carrying a 30-minute reset-scoped token.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let email = require_field(&req.email, "email")?;

    let user = User::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let token = jwt::create_token(
        &jwt::Claims::new(user.id, jwt::TokenType::Reset),
        state.jwt_secret(),
    )
    .map_err(|e| ApiError::Internal(format!("Token generation failed: {}", e)))?;

    state.mailer.send(Notification::PasswordReset {
        to: user.email.clone(),
        reset_url: state.config.reset_link(&token),
    });

    Ok(Json(json!({ "message": "Password reset email sent" })))
}

/// `POST /auth/reset-password`
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let (token, new_password) = match (req.token.as_deref(), req.password.as_deref()) {
        (Some(token), Some(password)) if !token.is_empty() && !password.is_empty() => {
            (token, password)
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Token and password are required".to_string(),
            ))
        }
    };

    let claims = jwt::validate_reset_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    password::validate_password(new_password)
        .map_err(|msg| ApiError::field("password", msg))?;

    let password_hash = password::hash_password(new_password)?;
    User::set_password(&state.db, user.id, &password_hash).await?;

    Ok(Json(json!({
        "message": "Password has been updated successfully"
    })))
}

/// `POST /auth/refresh`
///
/// Accepts the refresh token from the JSON body, the bearer header, or the
/// refresh cookie, and answers with a fresh access token (also re-set as a
/// cookie). 404 when the token's subject no longer exists.
pub async fn refresh(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<Response> {
    let token = body
        .as_ref()
        .and_then(|Json(req)| req.refresh_token.as_deref())
        .or_else(|| crate::middleware::auth::bearer_token(&headers))
        .or_else(|| cookies::cookie_value(&headers, cookies::REFRESH_COOKIE))
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Unauthorized("Missing refresh token".to_string()))?;

    let claims = jwt::validate_refresh_token(&token, state.jwt_secret())?;

    if User::find_by_id(&state.db, claims.sub).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let access = jwt::create_token(
        &jwt::Claims::new(claims.sub, jwt::TokenType::Access),
        state.jwt_secret(),
    )
    .map_err(|e| ApiError::Internal(format!("Token generation failed: {}", e)))?;

    let secure = state.secure_cookies();
    Ok((
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, cookies::access_cookie(&access, secure))]),
        Json(json!({ "access_token": access })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_field_rejects_missing_and_empty() {
        assert!(require_field(&None, "username").is_err());
        assert!(require_field(&Some(String::new()), "username").is_err());
        assert_eq!(require_field(&Some("alice".to_string()), "username").unwrap(), "alice");
    }

    #[test]
    fn test_require_field_error_is_field_keyed() {
        let err = require_field(&None, "confirmPassword").unwrap_err();
        match err {
            ApiError::Validation(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "confirmPassword");
                assert_eq!(details[0].message, "confirmPassword is required");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_email_format_check() {
        assert!("alice@example.com".validate_email());
        assert!(!"not-an-email".validate_email());
        assert!(!"@example.com".validate_email());
    }
}
