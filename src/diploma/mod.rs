mod repository;
mod service;

pub use repository::*;
pub use service::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::sanitize_opt;

/// Final score of a subject written on the diploma.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiplomaGrade {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub subject_code: String,
    pub subject_name: String,
    pub final_score: f64,
    pub graduation_year: Option<String>,
    pub diploma_number: Option<String>,
    pub graduated_on: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewDiplomaGrade {
    pub subject_id: i64,
    #[validate(range(min = 0.0, max = 100.0, message = "Score must be between 0 and 100."))]
    pub final_score: f64,
    #[validate(length(max = 10))]
    pub graduation_year: Option<String>,
    #[validate(length(max = 50))]
    pub diploma_number: Option<String>,
    pub graduated_on: Option<NaiveDate>,
}

impl NewDiplomaGrade {
    pub fn sanitized(self) -> Self {
        Self {
            graduation_year: sanitize_opt(self.graduation_year.as_deref()),
            diploma_number: sanitize_opt(self.diploma_number.as_deref()),
            ..self
        }
    }
}
