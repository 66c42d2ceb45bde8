mod repository;
mod service;

pub use repository::*;
pub use service::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::{sanitize, sanitize_opt};
use crate::student::DEFAULT_NATIONALITY;

/// Guardian of a student, when someone other than the parents is in charge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Guardian {
    pub id: i64,
    pub student_id: i64,
    pub name: String,
    /// `L` or `P`.
    pub gender: String,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: String,
    pub last_education: Option<String>,
    pub occupation: Option<String>,
    pub monthly_income: Option<f64>,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Relationship with the student, such as uncle.
    pub relationship: Option<String>,
}

fn default_nationality() -> String {
    DEFAULT_NATIONALITY.into()
}

/// Guardian replacing the current one of a student.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewGuardian {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters long."))]
    pub name: String,
    #[validate(custom(
        function = "crate::router::validate_gender",
        message = "Gender must be 'L' or 'P'."
    ))]
    pub gender: String,
    #[validate(length(max = 100))]
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[serde(default = "default_nationality")]
    #[validate(length(max = 50))]
    pub nationality: String,
    #[validate(length(max = 50))]
    pub last_education: Option<String>,
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
    #[validate(range(min = 0.0, message = "Income must not be negative."))]
    pub monthly_income: Option<f64>,
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 50))]
    pub relationship: Option<String>,
}

impl NewGuardian {
    /// Escape free text. A blank nationality falls back to the default one.
    pub fn sanitized(self) -> Self {
        let nationality = sanitize(&self.nationality);

        Self {
            name: sanitize(&self.name),
            gender: self.gender,
            birth_place: sanitize_opt(self.birth_place.as_deref()),
            birth_date: self.birth_date,
            nationality: if nationality.is_empty() {
                default_nationality()
            } else {
                nationality
            },
            last_education: sanitize_opt(self.last_education.as_deref()),
            occupation: sanitize_opt(self.occupation.as_deref()),
            monthly_income: self.monthly_income,
            address: sanitize_opt(self.address.as_deref()),
            phone: sanitize_opt(self.phone.as_deref()),
            relationship: sanitize_opt(self.relationship.as_deref()),
        }
    }
}
