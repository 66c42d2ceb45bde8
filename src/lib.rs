//! Induk is a student record API for vocational schools.

#![forbid(unsafe_code)]

mod address;
mod attendance;
mod crypto;
mod database;
mod diploma;
mod education;
pub mod error;
mod grade;
mod guardian;
mod health;
mod middleware;
mod model;
mod note;
mod parent;
pub mod ratelimiter;
mod router;
mod student;
pub mod telemetry;
mod token;
mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::routing::{delete, get, post, put};
use axum::{Router, middleware as AxumMiddleware};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::address::{AddressRepository, AddressService, PgAddressRepository};
use crate::attendance::{AttendanceRepository, AttendanceService, PgAttendanceRepository};
use crate::crypto::PasswordManager;
use crate::diploma::{DiplomaRepository, DiplomaService, PgDiplomaRepository};
use crate::education::{EducationRepository, EducationService, PgEducationRepository};
use crate::grade::{GradeRepository, GradeService, PgGradeRepository};
use crate::guardian::{GuardianRepository, GuardianService, PgGuardianRepository};
use crate::health::{HealthRepository, HealthService, PgHealthRepository};
use crate::note::{NoteRepository, NoteService, PgNoteRepository};
use crate::parent::{ParentRepository, ParentService, PgParentRepository};
use crate::ratelimiter::RateLimiter;
use crate::student::{PgStudentRepository, StudentRepository, StudentService};
use crate::token::TokenManager;
use crate::user::{AuthService, PgUserRepository, UserRepository};

/// Environment variable holding the default administrator password.
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";
const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Storage backends used by services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub students: Arc<dyn StudentRepository>,
    pub parents: Arc<dyn ParentRepository>,
    pub grades: Arc<dyn GradeRepository>,
    pub addresses: Arc<dyn AddressRepository>,
    pub guardians: Arc<dyn GuardianRepository>,
    pub health: Arc<dyn HealthRepository>,
    pub education: Arc<dyn EducationRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub diplomas: Arc<dyn DiplomaRepository>,
    pub notes: Arc<dyn NoteRepository>,
}

impl Repositories {
    /// PostgreSQL repositories sharing `pool`.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            students: Arc::new(PgStudentRepository::new(pool.clone())),
            parents: Arc::new(PgParentRepository::new(pool.clone())),
            grades: Arc::new(PgGradeRepository::new(pool.clone())),
            addresses: Arc::new(PgAddressRepository::new(pool.clone())),
            guardians: Arc::new(PgGuardianRepository::new(pool.clone())),
            health: Arc::new(PgHealthRepository::new(pool.clone())),
            education: Arc::new(PgEducationRepository::new(pool.clone())),
            attendance: Arc::new(PgAttendanceRepository::new(pool.clone())),
            diplomas: Arc::new(PgDiplomaRepository::new(pool.clone())),
            notes: Arc::new(PgNoteRepository::new(pool)),
        }
    }
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub limiter: RateLimiter,
    pub auth: AuthService,
    pub students: StudentService,
    pub parents: ParentService,
    pub grades: GradeService,
    pub addresses: AddressService,
    pub guardians: GuardianService,
    pub health: HealthService,
    pub education: EducationService,
    pub attendance: AttendanceService,
    pub diplomas: DiplomaService,
    pub notes: NoteService,
}

impl AppState {
    /// Wire services together.
    pub fn new(
        config: Arc<config::Configuration>,
        limiter: RateLimiter,
        passwords: Arc<PasswordManager>,
        tokens: TokenManager,
        repositories: Repositories,
    ) -> Self {
        let students = StudentService::new(&repositories);
        let Repositories {
            users,
            students: student_repository,
            parents,
            grades,
            addresses,
            guardians,
            health,
            education,
            attendance,
            diplomas,
            notes,
        } = repositories;
        let owner = || Arc::clone(&student_repository);

        Self {
            config,
            limiter,
            auth: AuthService::new(users, passwords, tokens),
            students,
            parents: ParentService::new(owner(), parents),
            diplomas: DiplomaService::new(owner(), Arc::clone(&grades), diplomas),
            grades: GradeService::new(owner(), grades),
            addresses: AddressService::new(owner(), addresses),
            guardians: GuardianService::new(owner(), guardians),
            health: HealthService::new(owner(), health),
            education: EducationService::new(owner(), education),
            attendance: AttendanceService::new(owner(), attendance),
            notes: NoteService::new(owner(), notes),
        }
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let server = &state.config.server;

    let middleware = ServiceBuilder::new()
        // Compress responses.
        .layer(CompressionLayer::new())
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.timeout_secs),
        ))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .max_age(CORS_MAX_AGE),
        )
        // Bodies above the limit are rejected by extractors with `413`.
        .layer(DefaultBodyLimit::max(server.body_limit))
        // Security headers.
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'"),
        ));

    let api = Router::new()
        .route("/auth/register", post(router::auth::register))
        .route("/auth/profile", get(router::auth::profile))
        .route("/students", post(router::students::create).get(router::students::list))
        .route(
            "/students/{id}",
            get(router::students::get)
                .put(router::students::update)
                .delete(router::students::delete),
        )
        .route("/students/{id}/parents", post(router::parents::create))
        .route(
            "/parents/{id}",
            put(router::parents::update).delete(router::parents::delete),
        )
        .route("/subjects", get(router::grades::subjects))
        .route(
            "/students/{id}/grades",
            post(router::grades::create).get(router::grades::list),
        )
        .route("/students/{id}/grades/batch", post(router::grades::create_batch))
        .route("/students/{id}/address", put(router::addresses::save))
        .route("/students/{id}/guardian", post(router::guardians::save))
        .route("/students/{id}/health-record", post(router::health::save))
        .route("/health-records/{id}/illnesses", post(router::health::add_illness))
        .route("/illnesses/{id}", delete(router::health::delete_illness))
        .route("/students/{id}/education", post(router::education::create))
        .route(
            "/education/{id}",
            put(router::education::update).delete(router::education::delete),
        )
        .route(
            "/students/{id}/attendance",
            post(router::attendance::record).get(router::attendance::list),
        )
        .route(
            "/students/{id}/diploma-grades",
            post(router::diplomas::create).get(router::diplomas::list),
        )
        .route(
            "/students/{id}/semester-notes",
            post(router::notes::create).get(router::notes::list),
        )
        .route("/semester-notes/{id}/internships", post(router::notes::add_internship))
        .route_layer(AxumMiddleware::from_fn_with_state(state.clone(), middleware::auth))
        // Public routes.
        .route("/health", get(router::status::health))
        .route("/auth/login", post(router::auth::login))
        // Rate limit every request, authenticated or not.
        .layer(AxumMiddleware::from_fn_with_state(state.clone(), middleware::rate_limit))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    // fail fast on an unusable limiter.
    let limiter = RateLimiter::new(config.rate_limit.limit, config.rate_limit.window())?;
    let tokens = TokenManager::new(&config.token.secret, config.token.expiry_hours)?;
    let passwords = Arc::new(PasswordManager::new(config.argon2.clone())?);

    let Some(postgres) = &config.postgres else {
        return Err("missing `postgres` entry on `config.yaml` file".into());
    };
    let db = database::Database::from_config(postgres).await?;

    // execute migrations scripts on start.
    db.migrate().await?;

    let state = AppState::new(
        Arc::clone(&config),
        limiter,
        passwords,
        tokens,
        Repositories::postgres(db.postgres),
    );

    let admin_password = std::env::var(ADMIN_PASSWORD_ENV)
        .unwrap_or_else(|_| user::DEFAULT_ADMIN_PASSWORD.to_owned());
    state.auth.seed_admin(&admin_password).await?;

    Ok(state)
}

/// State backed by in-memory repositories with a seeded administrator.
#[cfg(test)]
pub async fn test_state() -> AppState {
    test_state_with(config::Configuration::default()).await
}

#[cfg(test)]
pub async fn test_state_with(config: config::Configuration) -> AppState {
    let limiter = RateLimiter::new(config.rate_limit.limit, config.rate_limit.window())
        .expect("valid rate limit");
    let tokens = TokenManager::new("test-secret", config.token.expiry_hours)
        .expect("cannot create token manager");

    let state = AppState::new(
        Arc::new(config),
        limiter,
        Arc::new(crypto::tests::light()),
        tokens,
        Repositories::memory(),
    );

    state
        .auth
        .seed_admin(user::DEFAULT_ADMIN_PASSWORD)
        .await
        .expect("cannot seed administrator");
    state
}

/// Signed token of the seeded administrator.
#[cfg(test)]
pub async fn admin_token(state: &AppState) -> String {
    state
        .auth
        .login(user::ADMIN_USERNAME, user::DEFAULT_ADMIN_PASSWORD)
        .await
        .expect("cannot login as administrator")
        .token
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    token: Option<&str>,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// Read a JSON response body.
#[cfg(test)]
pub async fn body_json<T: serde::de::DeserializeOwned>(
    response: axum::http::Response<axum::body::Body>,
) -> T {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
