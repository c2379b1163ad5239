use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::LocalChange,
    dto::job_dto::{
        BrowseJobsQuery, JobListResponse, JobResponse, PostJobPayload, SetActivePayload,
        UpdateJobPayload,
    },
    error::Result,
    middleware::auth::AuthUser,
    routes::schedule_refresh,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = PostJobPayload,
    responses(
        (status = 201, description = "Job posted", body = Json<JobResponse>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn post_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<PostJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.post_job(user.id, payload).await?;

    let cache = state.caches.for_user(user.id);
    cache.apply(LocalChange::JobPosted { job: job.clone() });
    schedule_refresh(&state, user.id);

    Ok((StatusCode::CREATED, Json(JobResponse::from(job))))
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(
        ("location" = Option<String>, Query, description = "Location substring filter")
    ),
    responses(
        (status = 200, description = "Open jobs, the caller's own hidden", body = Json<JobListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn browse_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<BrowseJobsQuery>,
) -> Result<impl IntoResponse> {
    let jobs = state
        .job_service
        .browse_jobs(user.id, query.location.as_deref())
        .await?;
    Ok(Json(JobListResponse::from(jobs)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/mine",
    responses(
        (status = 200, description = "The caller's postings", body = Json<JobListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_my_jobs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.list_my_jobs(user.id).await?;
    Ok(Json(JobListResponse::from(jobs)))
}

#[utoipa::path(
    patch,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job updated", body = Json<JobResponse>),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job owned by another user")
    )
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.edit_job(user.id, id, payload).await?;

    let cache = state.caches.for_user(user.id);
    cache.apply(LocalChange::JobEdited { job: job.clone() });
    schedule_refresh(&state, user.id);

    Ok(Json(JobResponse::from(job)))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/active",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = SetActivePayload,
    responses(
        (status = 200, description = "Job opened or closed", body = Json<JobResponse>),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn set_job_active(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetActivePayload>,
) -> Result<impl IntoResponse> {
    let job = state
        .job_service
        .set_active(user.id, id, payload.active)
        .await?;

    let cache = state.caches.for_user(user.id);
    cache.apply(LocalChange::JobToggled {
        job_id: id,
        active: payload.active,
    });
    schedule_refresh(&state, user.id);

    Ok(Json(JobResponse::from(job)))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.job_service.delete_job(user.id, id).await?;

    let cache = state.caches.for_user(user.id);
    cache.apply(LocalChange::JobDeleted { job_id: id });
    schedule_refresh(&state, user.id);

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/reconcile",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Cleanup steps re-run for the job"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job owned by another user")
    )
)]
#[axum::debug_handler]
pub async fn reconcile_job(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let outcome = state.application_service.reconcile_job(user.id, id).await?;
    schedule_refresh(&state, user.id);
    Ok(Json(outcome))
}
