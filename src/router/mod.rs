//! HTTP handlers.

pub mod addresses;
pub mod attendance;
pub mod auth;
pub mod diplomas;
pub mod education;
pub mod grades;
pub mod guardians;
pub mod health;
pub mod notes;
pub mod parents;
pub mod status;
pub mod students;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::error::ServerError;
use crate::student::is_valid_nisn;

/// JSON body checked with [`Validate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// [`axum::extract::Path`] answering with a problem document.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServerError))]
pub struct Path<T>(pub T);

/// [`axum::extract::Query`] answering with a problem document.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServerError))]
pub struct Query<T>(pub T);

pub fn validate_nisn(nisn: &str) -> Result<(), ValidationError> {
    if is_valid_nisn(nisn) {
        Ok(())
    } else {
        Err(ValidationError::new("nisn"))
    }
}

pub fn validate_gender(gender: &str) -> Result<(), ValidationError> {
    match gender {
        "L" | "P" => Ok(()),
        _ => Err(ValidationError::new("gender")),
    }
}

pub fn validate_parent_kind(kind: &str) -> Result<(), ValidationError> {
    match kind {
        "father" | "mother" => Ok(()),
        _ => Err(ValidationError::new("kind")),
    }
}

pub fn validate_class(class: &str) -> Result<(), ValidationError> {
    match class {
        "X" | "XI" | "XII" => Ok(()),
        _ => Err(ValidationError::new("class")),
    }
}

pub fn validate_letter_grade(grade: &str) -> Result<(), ValidationError> {
    match grade {
        "A" | "B" | "C" | "D" => Ok(()),
        _ => Err(ValidationError::new("grade")),
    }
}

pub fn validate_blood_type(blood_type: &str) -> Result<(), ValidationError> {
    match blood_type {
        "A" | "B" | "AB" | "O" => Ok(()),
        _ => Err(ValidationError::new("blood_type")),
    }
}

pub fn validate_education_kind(kind: &str) -> Result<(), ValidationError> {
    match kind {
        "new_student" | "transfer" => Ok(()),
        _ => Err(ValidationError::new("kind")),
    }
}
