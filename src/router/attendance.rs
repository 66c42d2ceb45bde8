//! Attendance per semester.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::AppState;
use crate::attendance::{Attendance, NewAttendance};
use crate::error::Result;
use crate::model::{Page, PageRequest};
use crate::router::{Path, Query, Valid};

/// Handler of `POST /students/{id}/attendance`. Replaces the attendance of
/// the same class and semester.
pub async fn record(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Valid(body): Valid<NewAttendance>,
) -> Result<Json<Attendance>> {
    Ok(Json(state.attendance.record(student_id, body).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Handler of `GET /students/{id}/attendance`.
pub async fn list(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Attendance>>> {
    let page = PageRequest::new(query.page, query.page_size);
    Ok(Json(state.attendance.list(student_id, page).await?))
}
