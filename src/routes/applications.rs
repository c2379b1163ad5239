use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::{LocalChange, ReconciliationCache},
    dto::application_dto::{DecisionPayload, SubmitApplicationPayload, SubmitResponse},
    error::Result,
    middleware::auth::AuthUser,
    routes::schedule_refresh,
    services::application_service::SubmitOutcome,
    AppState,
};

/// Hand out the user's cache, re-reading the store first when the cached
/// view cannot be trusted.
async fn fresh_cache(state: &AppState, user_id: Uuid) -> Result<Arc<ReconciliationCache>> {
    let cache = state.caches.for_user(user_id);
    if cache.is_stale() {
        let view = state.application_service.dashboard(user_id).await?;
        cache.reconcile(view);
    }
    Ok(cache)
}

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = SubmitApplicationPayload,
    responses(
        (status = 201, description = "Application submitted", body = Json<SubmitResponse>),
        (status = 200, description = "Already applied to this job", body = Json<SubmitResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job is no longer open")
    )
)]
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SubmitApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .application_service
        .submit_application(
            user.id,
            &user.email,
            payload.job_id,
            payload.message,
            payload.resume_key,
        )
        .await?;

    let cache = state.caches.for_user(user.id);
    cache.apply(LocalChange::ApplicationSubmitted {
        job_id: payload.job_id,
    });
    schedule_refresh(&state, user.id);

    let status = match outcome {
        SubmitOutcome::Submitted(_) => StatusCode::CREATED,
        SubmitOutcome::AlreadyApplied => StatusCode::OK,
    };
    Ok((status, Json(SubmitResponse::from(outcome))))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/decision",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = DecisionPayload,
    responses(
        (status = 200, description = "Decision recorded"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application already decided, or a rival was accepted first")
    )
)]
#[axum::debug_handler]
pub async fn decide_application(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecisionPayload>,
) -> Result<impl IntoResponse> {
    let cache = state.caches.for_user(user.id);

    // Guess the outcome locally before the store round-trip; the cached
    // view knows which job the application belongs to.
    let job_hint = cache
        .snapshot()
        .received
        .iter()
        .find(|r| r.application.id == id)
        .map(|r| r.application.job_id);
    if let Some(job_id) = job_hint {
        cache.apply(LocalChange::ApplicationDecided {
            application_id: id,
            job_id,
            decision: payload.decision,
        });
    }

    match state
        .application_service
        .decide_application(user.id, id, payload.decision)
        .await
    {
        Ok(outcome) => {
            schedule_refresh(&state, user.id);
            Ok(Json(outcome))
        }
        Err(err) => {
            // The guess was wrong; discard it and re-read.
            cache.mark_stale();
            schedule_refresh(&state, user.id);
            Err(err)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/applications/received",
    responses(
        (status = 200, description = "Applications to the caller's jobs, grouped by job")
    )
)]
#[axum::debug_handler]
pub async fn list_received_applications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let cache = fresh_cache(&state, user.id).await?;
    Ok(Json(cache.grouped_received()))
}

#[utoipa::path(
    get,
    path = "/api/applications/mine",
    responses(
        (status = 200, description = "The caller's submitted applications")
    )
)]
#[axum::debug_handler]
pub async fn list_my_applications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let cache = fresh_cache(&state, user.id).await?;
    Ok(Json(cache.snapshot().submitted))
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "The caller's postings and both application lists")
    )
)]
#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let cache = fresh_cache(&state, user.id).await?;
    Ok(Json(cache.snapshot()))
}
