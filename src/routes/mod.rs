use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod applications;
pub mod health;
pub mod jobs;
pub mod resumes;

/// Queue the deferred authoritative re-fetch that follows a mutation.
pub(crate) fn schedule_refresh(state: &AppState, user_id: uuid::Uuid) {
    let cache = state.caches.for_user(user_id);
    let service = state.application_service.clone();
    cache.schedule_reconcile(state.reconcile_delay, move || async move {
        service.dashboard(user_id).await
    });
}

/// All authenticated API routes. `/health` and the `/uploads` file service
/// are attached by the binary, outside the bearer-auth layer.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/jobs", get(jobs::browse_jobs).post(jobs::post_job))
        .route("/api/jobs/mine", get(jobs::list_my_jobs))
        .route(
            "/api/jobs/:id",
            axum::routing::patch(jobs::update_job).delete(jobs::delete_job),
        )
        .route("/api/jobs/:id/active", post(jobs::set_job_active))
        .route("/api/jobs/:id/reconcile", post(jobs::reconcile_job))
        .route("/api/applications", post(applications::submit_application))
        .route("/api/applications/mine", get(applications::list_my_applications))
        .route(
            "/api/applications/received",
            get(applications::list_received_applications),
        )
        .route(
            "/api/applications/:id/decision",
            post(applications::decide_application),
        )
        .route("/api/dashboard", get(applications::get_dashboard))
        .route("/api/resumes", post(resumes::upload_resume))
        .route("/api/resumes/url", get(resumes::resume_url))
        .layer(axum::middleware::from_fn(
            crate::middleware::auth::require_bearer_auth,
        ))
        .with_state(state)
}
