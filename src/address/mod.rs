mod repository;
mod service;

pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::{sanitize, sanitize_opt};

/// Home address of a student. A student has at most one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub id: i64,
    pub student_id: i64,
    pub street: String,
    pub village: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    /// Who the student lives with.
    pub lives_with: Option<String>,
    pub distance_km: Option<f64>,
    pub transport: Option<String>,
}

/// Address replacing the current one of a student.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewAddress {
    #[validate(length(min = 1, message = "Street must not be empty."))]
    pub street: String,
    #[validate(length(max = 100))]
    pub village: Option<String>,
    #[validate(length(max = 100))]
    pub district: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub province: Option<String>,
    #[validate(length(max = 10))]
    pub postal_code: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 50))]
    pub lives_with: Option<String>,
    #[validate(range(min = 0.0, max = 999.99, message = "Distance must be between 0 and 999.99 km."))]
    pub distance_km: Option<f64>,
    #[validate(length(max = 50))]
    pub transport: Option<String>,
}

impl NewAddress {
    /// Escape free text. Blank optional values become `None`.
    pub fn sanitized(self) -> Self {
        Self {
            street: sanitize(&self.street),
            village: sanitize_opt(self.village.as_deref()),
            district: sanitize_opt(self.district.as_deref()),
            city: sanitize_opt(self.city.as_deref()),
            province: sanitize_opt(self.province.as_deref()),
            postal_code: sanitize_opt(self.postal_code.as_deref()),
            phone: sanitize_opt(self.phone.as_deref()),
            lives_with: sanitize_opt(self.lives_with.as_deref()),
            distance_km: self.distance_km,
            transport: sanitize_opt(self.transport.as_deref()),
        }
    }
}
