mod repository;
mod service;

pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::{sanitize, sanitize_opt};

/// Notes kept for one semester of a student, with the internships done
/// during that semester.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SemesterNote {
    pub id: i64,
    pub student_id: i64,
    pub class: String,
    pub semester: i32,
    #[sqlx(skip)]
    pub internships: Vec<Internship>,
}

/// Industrial work practice (PKL).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Internship {
    pub id: i64,
    pub note_id: i64,
    pub company: String,
    pub location: Option<String>,
    pub months: Option<i32>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewSemesterNote {
    #[validate(custom(
        function = "crate::router::validate_class",
        message = "Class must be 'X', 'XI' or 'XII'."
    ))]
    pub class: String,
    #[validate(range(min = 1, max = 2, message = "Semester must be 1 or 2."))]
    pub semester: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewInternship {
    #[validate(length(min = 1, max = 200, message = "Company must be 1 to 200 characters long."))]
    pub company: String,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(range(min = 1, max = 36))]
    pub months: Option<i32>,
    pub description: Option<String>,
}

impl NewInternship {
    pub fn sanitized(self) -> Self {
        Self {
            company: sanitize(&self.company),
            location: sanitize_opt(self.location.as_deref()),
            months: self.months,
            description: sanitize_opt(self.description.as_deref()),
        }
    }
}
