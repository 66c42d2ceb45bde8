//! Previous education of a student.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::AppState;
use crate::education::{EducationChanges, NewEducation, PreviousEducation};
use crate::error::Result;
use crate::router::{Path, Valid};

/// Handler of `POST /students/{id}/education`.
pub async fn create(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Valid(body): Valid<NewEducation>,
) -> Result<(StatusCode, Json<PreviousEducation>)> {
    let education = state.education.add(student_id, body).await?;
    Ok((StatusCode::CREATED, Json(education)))
}

/// Handler of `PUT /education/{id}`.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Valid(body): Valid<EducationChanges>,
) -> Result<Json<PreviousEducation>> {
    Ok(Json(state.education.update(id, body).await?))
}

/// Handler of `DELETE /education/{id}`.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.education.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
