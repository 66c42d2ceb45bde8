//! Diploma scores.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::AppState;
use crate::diploma::{DiplomaGrade, NewDiplomaGrade};
use crate::error::Result;
use crate::router::{Path, Valid};

/// Handler of `POST /students/{id}/diploma-grades`.
pub async fn create(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Valid(body): Valid<NewDiplomaGrade>,
) -> Result<(StatusCode, Json<DiplomaGrade>)> {
    let grade = state.diplomas.create(student_id, body).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

/// Handler of `GET /students/{id}/diploma-grades`.
pub async fn list(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<Json<Vec<DiplomaGrade>>> {
    Ok(Json(state.diplomas.list(student_id).await?))
}
