//! Guardian of a student.

use axum::extract::State;
use axum::Json;

use crate::AppState;
use crate::error::Result;
use crate::guardian::{Guardian, NewGuardian};
use crate::router::{Path, Valid};

/// Handler of `POST /students/{id}/guardian`. Creates or replaces the
/// guardian.
pub async fn save(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Valid(body): Valid<NewGuardian>,
) -> Result<Json<Guardian>> {
    Ok(Json(state.guardians.save(student_id, body).await?))
}
