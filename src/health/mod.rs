mod repository;
mod service;

pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::{sanitize, sanitize_opt};

/// Body measurements and health notes of a student, taken on entry and on
/// leaving school.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HealthRecord {
    pub id: i64,
    pub student_id: i64,
    /// Kilograms.
    pub entry_weight: Option<f64>,
    /// Centimeters.
    pub entry_height: Option<f64>,
    pub exit_weight: Option<f64>,
    pub exit_height: Option<f64>,
    /// `A`, `B`, `AB` or `O`.
    pub blood_type: Option<String>,
    pub physical_fitness: Option<String>,
    #[sqlx(skip)]
    pub illnesses: Vec<Illness>,
}

/// Past illness attached to a health record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Illness {
    pub id: i64,
    pub health_record_id: i64,
    pub name: String,
    pub year: Option<i32>,
    pub duration: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewHealthRecord {
    #[validate(range(min = 0.0, max = 999.99))]
    pub entry_weight: Option<f64>,
    #[validate(range(min = 0.0, max = 999.99))]
    pub entry_height: Option<f64>,
    #[validate(range(min = 0.0, max = 999.99))]
    pub exit_weight: Option<f64>,
    #[validate(range(min = 0.0, max = 999.99))]
    pub exit_height: Option<f64>,
    #[validate(custom(
        function = "crate::router::validate_blood_type",
        message = "Blood type must be A, B, AB or O."
    ))]
    pub blood_type: Option<String>,
    pub physical_fitness: Option<String>,
}

impl NewHealthRecord {
    pub fn sanitized(self) -> Self {
        Self {
            blood_type: self
                .blood_type
                .map(|blood_type| blood_type.trim().to_uppercase())
                .filter(|blood_type| !blood_type.is_empty()),
            physical_fitness: sanitize_opt(self.physical_fitness.as_deref()),
            ..self
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewIllness {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters long."))]
    pub name: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[validate(length(max = 50))]
    pub duration: Option<String>,
    pub notes: Option<String>,
}

impl NewIllness {
    pub fn sanitized(self) -> Self {
        Self {
            name: sanitize(&self.name),
            year: self.year,
            duration: sanitize_opt(self.duration.as_deref()),
            notes: sanitize_opt(self.notes.as_deref()),
        }
    }
}
