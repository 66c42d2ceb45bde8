//! Parents of a student.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::parent::{NewParent, Parent, ParentChanges};
use crate::router::{Path, Valid};
use crate::student::DEFAULT_NATIONALITY;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateBody {
    #[validate(custom(
        function = "crate::router::validate_parent_kind",
        message = "Kind must be 'father' or 'mother'."
    ))]
    pub kind: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters long."))]
    pub name: String,
    #[validate(length(max = 100))]
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub nationality: Option<String>,
    #[validate(length(max = 50))]
    pub last_education: Option<String>,
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
    #[validate(range(min = 0.0, message = "Income must not be negative."))]
    pub monthly_income: Option<f64>,
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub alive: Option<bool>,
}

impl From<CreateBody> for NewParent {
    fn from(body: CreateBody) -> Self {
        NewParent {
            kind: body.kind,
            name: body.name,
            birth_place: body.birth_place,
            birth_date: body.birth_date,
            nationality: body
                .nationality
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NATIONALITY.into()),
            last_education: body.last_education,
            occupation: body.occupation,
            monthly_income: body.monthly_income,
            address: body.address,
            phone: body.phone,
            alive: body.alive.unwrap_or(true),
        }
    }
}

/// Handler of `POST /students/{id}/parents`.
pub async fn create(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Valid(body): Valid<CreateBody>,
) -> Result<(StatusCode, Json<Parent>)> {
    let parent = state.parents.create(student_id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(parent)))
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBody {
    #[validate(custom(
        function = "crate::router::validate_parent_kind",
        message = "Kind must be 'father' or 'mother'."
    ))]
    pub kind: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 50))]
    pub nationality: Option<String>,
    #[validate(length(max = 50))]
    pub last_education: Option<String>,
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
    #[validate(range(min = 0.0))]
    pub monthly_income: Option<f64>,
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub alive: Option<bool>,
}

impl From<UpdateBody> for ParentChanges {
    fn from(body: UpdateBody) -> Self {
        ParentChanges {
            kind: body.kind,
            name: body.name,
            birth_place: body.birth_place,
            birth_date: body.birth_date,
            nationality: body.nationality,
            last_education: body.last_education,
            occupation: body.occupation,
            monthly_income: body.monthly_income,
            address: body.address,
            phone: body.phone,
            alive: body.alive,
        }
    }
}

/// Handler of `PUT /parents/{id}`.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Valid(body): Valid<UpdateBody>,
) -> Result<Json<Parent>> {
    Ok(Json(state.parents.update(id, body.into()).await?))
}

/// Handler of `DELETE /parents/{id}`.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.parents.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
