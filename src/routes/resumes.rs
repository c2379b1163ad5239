use axum::{
    extract::{Extension, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::resume_dto::{ResumeUploadResponse, ResumeUrlQuery, ResumeUrlResponse},
    error::{Error, Result},
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/resumes",
    responses(
        (status = 201, description = "Resume stored", body = Json<ResumeUploadResponse>),
        (status = 400, description = "Missing file, empty file, or unsupported format")
    )
)]
#[axum::debug_handler]
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| Error::BadRequest("resume file has no name".to_string()))?;
        let bytes = field.bytes().await?;
        let key = state.resume_service.upload(user.id, &filename, bytes).await?;
        return Ok((StatusCode::CREATED, Json(ResumeUploadResponse { key })));
    }
    Err(Error::BadRequest(
        "multipart field 'file' is required".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/resumes/url",
    params(
        ("key" = String, Query, description = "Object key returned by the upload")
    ),
    responses(
        (status = 200, description = "Public URL for the object", body = Json<ResumeUrlResponse>),
        (status = 404, description = "Key does not belong to the caller")
    )
)]
#[axum::debug_handler]
pub async fn resume_url(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ResumeUrlQuery>,
) -> Result<impl IntoResponse> {
    // Keys are prefixed with the uploader's id. The uploader may always
    // resolve; a job owner may resolve keys attached to applications they
    // received.
    let own = query.key.starts_with(&format!("{}/", user.id));
    if !own {
        let received = state.store.list_received_applications(user.id).await?;
        let attached = received
            .iter()
            .any(|r| r.application.resume_key.as_deref() == Some(query.key.as_str()));
        if !attached {
            return Err(Error::NotFound("Resume not found".to_string()));
        }
    }
    let url = state.resume_service.public_url(&query.key);
    Ok(Json(ResumeUrlResponse { url }))
}
