mod repository;
mod service;

pub use repository::*;
pub use service::*;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::address::Address;
use crate::education::PreviousEducation;
use crate::guardian::Guardian;
use crate::health::HealthRecord;
use crate::model::{PageRequest, SortDirection};
use crate::parent::Parent;

pub const DEFAULT_NATIONALITY: &str = "Indonesia";

/// Student as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub registration_number: String,
    pub nisn: String,
    pub full_name: String,
    pub nickname: Option<String>,
    /// `L` or `P`.
    pub gender: String,
    pub birth_place: String,
    pub birth_date: NaiveDate,
    pub religion: String,
    pub child_order: i32,
    pub siblings: i32,
    pub nationality: String,
    pub home_language: String,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Student with everything recorded about them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: Student,
    pub parents: Vec<Parent>,
    pub address: Option<Address>,
    pub guardian: Option<Guardian>,
    pub health: Option<HealthRecord>,
    pub education: Vec<PreviousEducation>,
}

/// Student waiting to be inserted. Limits match the stored columns and are
/// checked again once text is escaped.
#[derive(Clone, Debug, PartialEq, Validate)]
pub struct NewStudent {
    #[validate(length(min = 1, max = 20))]
    pub registration_number: String,
    pub nisn: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(max = 50))]
    pub nickname: Option<String>,
    pub gender: String,
    #[validate(length(min = 1, max = 100))]
    pub birth_place: String,
    pub birth_date: NaiveDate,
    #[validate(length(min = 1, max = 20))]
    pub religion: String,
    pub child_order: i32,
    pub siblings: i32,
    #[validate(length(min = 1, max = 50))]
    pub nationality: String,
    #[validate(length(min = 1, max = 50))]
    pub home_language: String,
}

/// Fields to change on a student, `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct StudentChanges {
    #[validate(length(min = 1, max = 20))]
    pub registration_number: Option<String>,
    pub nisn: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(max = 50))]
    pub nickname: Option<String>,
    pub gender: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 20))]
    pub religion: Option<String>,
    pub child_order: Option<i32>,
    pub siblings: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub nationality: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub home_language: Option<String>,
}

impl StudentChanges {
    /// Apply changes on `student`.
    pub fn apply(self, student: &mut Student) {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set(&mut student.registration_number, self.registration_number);
        set(&mut student.nisn, self.nisn);
        set(&mut student.full_name, self.full_name);
        if self.nickname.is_some() {
            student.nickname = self.nickname;
        }
        set(&mut student.gender, self.gender);
        set(&mut student.birth_place, self.birth_place);
        set(&mut student.birth_date, self.birth_date);
        set(&mut student.religion, self.religion);
        set(&mut student.child_order, self.child_order);
        set(&mut student.siblings, self.siblings);
        set(&mut student.nationality, self.nationality);
        set(&mut student.home_language, self.home_language);
    }
}

/// Columns a student list can be sorted by.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentSort {
    #[default]
    CreatedAt,
    FullName,
    Nisn,
    RegistrationNumber,
    BirthDate,
}

impl StudentSort {
    pub fn column(&self) -> &'static str {
        match self {
            StudentSort::CreatedAt => "created_at",
            StudentSort::FullName => "full_name",
            StudentSort::Nisn => "nisn",
            StudentSort::RegistrationNumber => "registration_number",
            StudentSort::BirthDate => "birth_date",
        }
    }
}

/// Filters of a student list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StudentQuery {
    /// Case-insensitive match on name, NISN or registration number.
    pub search: Option<String>,
    pub sort_by: StudentSort,
    pub sort_dir: SortDirection,
    pub page: PageRequest,
}
