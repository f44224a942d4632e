pub mod health;
pub mod worker;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::resumes::{handlers as resumes, upload::MAX_FILE_SIZE};
use crate::state::AppState;
use crate::users::handlers as users;

/// Headroom over the file limit for multipart framing and other fields.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/worker/ping", post(worker::handle_worker_ping))
        // Users
        .route(
            "/api/v1/users/profile",
            get(users::handle_get_profile).patch(users::handle_update_profile),
        )
        .route("/api/v1/users/logout", post(users::handle_logout))
        .route(
            "/api/v1/users/validate-registration",
            post(users::handle_validate_registration),
        )
        // Resumes
        .route("/api/v1/resumes", get(resumes::handle_list_resumes))
        .route(
            "/api/v1/resumes/analytics",
            get(resumes::handle_resume_analytics),
        )
        .route(
            "/api/v1/resumes/preflight",
            post(resumes::handle_preflight)
                .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + MULTIPART_OVERHEAD)),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get_resume).delete(resumes::handle_delete_resume),
        )
        .with_state(state)
}
