//! Semester notes and internships.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::AppState;
use crate::error::Result;
use crate::note::{Internship, NewInternship, NewSemesterNote, SemesterNote};
use crate::router::{Path, Valid};

/// Handler of `POST /students/{id}/semester-notes`.
pub async fn create(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Valid(body): Valid<NewSemesterNote>,
) -> Result<(StatusCode, Json<SemesterNote>)> {
    let note = state.notes.create(student_id, body).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Handler of `GET /students/{id}/semester-notes`.
pub async fn list(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<Json<Vec<SemesterNote>>> {
    Ok(Json(state.notes.list(student_id).await?))
}

/// Handler of `POST /semester-notes/{id}/internships`.
pub async fn add_internship(
    State(state): State<AppState>,
    Path(note_id): Path<i64>,
    Valid(body): Valid<NewInternship>,
) -> Result<(StatusCode, Json<Internship>)> {
    let internship = state.notes.add_internship(note_id, body).await?;
    Ok((StatusCode::CREATED, Json(internship)))
}
