mod repository;
mod service;

pub use repository::*;
pub use service::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::{sanitize, sanitize_opt};

/// School attended before entering, either as a new student or a transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PreviousEducation {
    pub id: i64,
    pub student_id: i64,
    /// `new_student` or `transfer`.
    pub kind: String,
    pub admitted_on: NaiveDate,
    pub school_name: String,
    pub school_address: Option<String>,
    pub diploma_number: Option<String>,
    pub diploma_date: Option<NaiveDate>,
    /// National exam certificate.
    pub skhun_number: Option<String>,
    pub skhun_date: Option<NaiveDate>,
    /// Class the student was admitted into, `X`, `XI` or `XII`.
    pub admitted_class: Option<String>,
    pub transfer_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewEducation {
    #[validate(custom(
        function = "crate::router::validate_education_kind",
        message = "Kind must be new_student or transfer."
    ))]
    pub kind: String,
    pub admitted_on: NaiveDate,
    #[validate(length(min = 1, max = 200, message = "School name must be 1 to 200 characters long."))]
    pub school_name: String,
    pub school_address: Option<String>,
    #[validate(length(max = 50))]
    pub diploma_number: Option<String>,
    pub diploma_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub skhun_number: Option<String>,
    pub skhun_date: Option<NaiveDate>,
    #[validate(custom(function = "crate::router::validate_class"))]
    pub admitted_class: Option<String>,
    pub transfer_reason: Option<String>,
}

impl NewEducation {
    pub fn sanitized(self) -> Self {
        Self {
            school_name: sanitize(&self.school_name),
            school_address: sanitize_opt(self.school_address.as_deref()),
            diploma_number: sanitize_opt(self.diploma_number.as_deref()),
            skhun_number: sanitize_opt(self.skhun_number.as_deref()),
            transfer_reason: sanitize_opt(self.transfer_reason.as_deref()),
            ..self
        }
    }
}

/// Fields to change on a previous education, `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct EducationChanges {
    #[validate(custom(function = "crate::router::validate_education_kind"))]
    pub kind: Option<String>,
    pub admitted_on: Option<NaiveDate>,
    #[validate(length(min = 1, max = 200))]
    pub school_name: Option<String>,
    pub school_address: Option<String>,
    #[validate(length(max = 50))]
    pub diploma_number: Option<String>,
    pub diploma_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub skhun_number: Option<String>,
    pub skhun_date: Option<NaiveDate>,
    #[validate(custom(function = "crate::router::validate_class"))]
    pub admitted_class: Option<String>,
    pub transfer_reason: Option<String>,
}

impl EducationChanges {
    pub fn sanitized(self) -> Self {
        Self {
            school_name: self.school_name.as_deref().map(sanitize),
            school_address: self.school_address.as_deref().map(sanitize),
            diploma_number: self.diploma_number.as_deref().map(sanitize),
            skhun_number: self.skhun_number.as_deref().map(sanitize),
            transfer_reason: self.transfer_reason.as_deref().map(sanitize),
            ..self
        }
    }

    /// Apply changes on `education`.
    pub fn apply(self, education: &mut PreviousEducation) {
        if let Some(kind) = self.kind {
            education.kind = kind;
        }
        if let Some(admitted_on) = self.admitted_on {
            education.admitted_on = admitted_on;
        }
        if let Some(school_name) = self.school_name {
            education.school_name = school_name;
        }

        education.school_address = self.school_address.or(education.school_address.take());
        education.diploma_number = self.diploma_number.or(education.diploma_number.take());
        education.diploma_date = self.diploma_date.or(education.diploma_date);
        education.skhun_number = self.skhun_number.or(education.skhun_number.take());
        education.skhun_date = self.skhun_date.or(education.skhun_date);
        education.admitted_class = self.admitted_class.or(education.admitted_class.take());
        education.transfer_reason = self.transfer_reason.or(education.transfer_reason.take());
    }
}
