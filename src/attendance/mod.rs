mod repository;
mod service;

pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Attendance summary of a student for one semester.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: i64,
    pub student_id: i64,
    pub class: String,
    pub semester: i32,
    pub present_days: i32,
    pub sick_days: i32,
    pub excused_days: i32,
    pub absent_days: i32,
    pub effective_days: i32,
    /// Share of effective days the student was present, two decimals.
    pub present_percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewAttendance {
    #[validate(custom(
        function = "crate::router::validate_class",
        message = "Class must be 'X', 'XI' or 'XII'."
    ))]
    pub class: String,
    #[validate(range(min = 1, max = 2, message = "Semester must be 1 or 2."))]
    pub semester: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub present_days: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub sick_days: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub excused_days: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub absent_days: i32,
    #[validate(range(min = 0, max = 366))]
    pub effective_days: i32,
}

impl NewAttendance {
    pub fn present_percentage(&self) -> f64 {
        present_percentage(self.present_days, self.effective_days)
    }
}

/// `present * 100 / effective` rounded to two decimals, `0` without
/// effective days.
pub fn present_percentage(present: i32, effective: i32) -> f64 {
    if effective <= 0 {
        return 0.0;
    }

    (f64::from(present) * 10_000.0 / f64::from(effective)).round() / 100.0
}
