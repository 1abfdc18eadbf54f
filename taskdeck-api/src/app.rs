/// Application state and router builder
///
/// # Router layout
///
/// ```text
/// /
/// ├── /health                       # liveness probe (public)
/// ├── /auth/                        # registration, login, OTP, reset (public)
/// ├── /user/
/// │   ├── POST /subscribe           # newsletter opt-in (public)
/// │   └── ...                       # profile + account management (authenticated)
/// ├── /projects/                    # project CRUD + reassignment (authenticated)
/// ├── /tasks/                       # task CRUD, assignment, archive (authenticated)
/// └── /analytics/                   # productivity stats (authenticated)
/// ```
///
/// # Middleware stack
///
/// Bottom to top: per-request tracing (tower-http TraceLayer), CORS from
/// configuration, security headers, and — on the protected groups — the
/// token-validating auth layer.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use taskdeck_shared::mail::Mailer;

use crate::{config::Config, middleware, routes};

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor; the pool and
/// mailer are internally reference-counted, the config sits behind an Arc.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Notification gateway handle
    pub mailer: Mailer,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Mailer) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Whether Secure cookie attributes apply
    pub fn secure_cookies(&self) -> bool {
        self.config.api.production
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public: no credential exists yet at these endpoints (logout only
    // clears cookies and refresh validates its own token).
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", get(routes::auth::logout))
        .route("/send-otp", post(routes::auth::send_otp))
        .route("/verify-otp", post(routes::auth::verify_otp))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password))
        .route("/refresh", post(routes::auth::refresh));

    let auth_layer = axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::require_auth,
    );

    // Newsletter signup is deliberately outside the auth layer: the
    // subscriber list is independent of user accounts.
    let user_routes = Router::new()
        .route("/profile", get(routes::users::get_profile))
        .route("/update-profile", put(routes::users::update_profile))
        .route("/profiles", get(routes::users::get_profiles))
        .route("/create-user", post(routes::users::create_team_member))
        .route("/:id", delete(routes::users::delete_user))
        .route("/updates-profile/:id", put(routes::users::admin_update_profile))
        .route("/change-password/:id", put(routes::users::change_password))
        .layer(auth_layer.clone())
        .route("/subscribe", post(routes::users::subscribe));

    let project_routes = Router::new()
        .route("/", post(routes::projects::create_project).get(routes::projects::get_projects))
        .route("/user", get(routes::projects::get_user_projects))
        .route(
            "/:id",
            put(routes::projects::update_project).delete(routes::projects::delete_project),
        )
        .route("/:id/assign", put(routes::projects::assign_project))
        .route("/:id/history", get(routes::projects::get_project_history))
        .layer(auth_layer.clone());

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task).get(routes::tasks::get_tasks))
        .route("/user-tasks", get(routes::tasks::get_user_tasks))
        .route("/team-tasks", get(routes::tasks::get_team_tasks))
        .route("/archived", get(routes::tasks::get_archived_tasks))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id/assign", put(routes::tasks::assign_task))
        .route("/:id/archive", delete(routes::tasks::archive_task))
        .route("/:id/restore", post(routes::tasks::restore_task))
        .route("/:id/history", get(routes::tasks::get_task_history))
        .layer(auth_layer.clone());

    let analytics_routes = Router::new()
        .route("/user", get(routes::analytics::user_analytics))
        .route("/team-leader", get(routes::analytics::team_analytics))
        .layer(auth_layer);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .nest("/user", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/analytics", analytics_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::security::security_headers,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, JwtConfig};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use taskdeck_shared::db::pool::DatabaseConfig;
    use tower::ServiceExt as _;

    fn test_state() -> AppState {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                frontend_url: "http://localhost:3000".to_string(),
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/unused".to_string(),
                ..Default::default()
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            mail: None,
        };

        // Lazy pool: never connects unless a handler actually queries.
        let db = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .expect("lazy pool");

        AppState::new(db, config, Mailer::disabled())
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = build_router(test_state());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("X-Content-Type-Options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn test_protected_route_rejects_anonymous() {
        let app = build_router(test_state());

        let response = app
            .oneshot(Request::get("/tasks/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route_rejects_garbage_token() {
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::get("/analytics/user")
                    .header("authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
