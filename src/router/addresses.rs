//! Home address of a student.

use axum::extract::State;
use axum::Json;

use crate::AppState;
use crate::address::{Address, NewAddress};
use crate::error::Result;
use crate::router::{Path, Valid};

/// Handler of `PUT /students/{id}/address`.
pub async fn save(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Valid(body): Valid<NewAddress>,
) -> Result<Json<Address>> {
    Ok(Json(state.addresses.save(student_id, body).await?))
}
