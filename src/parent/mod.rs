mod repository;
mod service;

pub use repository::*;
pub use service::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Father or mother of a student.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Parent {
    pub id: i64,
    pub student_id: i64,
    /// `father` or `mother`.
    pub kind: String,
    pub name: String,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: String,
    pub last_education: Option<String>,
    pub occupation: Option<String>,
    pub monthly_income: Option<f64>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub alive: bool,
}

/// Parent waiting to be inserted.
#[derive(Clone, Debug, PartialEq, Validate)]
pub struct NewParent {
    pub kind: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 100))]
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 50))]
    pub nationality: String,
    #[validate(length(max = 50))]
    pub last_education: Option<String>,
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
    pub monthly_income: Option<f64>,
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub alive: bool,
}

/// Fields to change on a parent, `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Validate)]
pub struct ParentChanges {
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
    pub monthly_income: Option<f64>,
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub alive: Option<bool>,
}

impl ParentChanges {
    /// Apply changes on `parent`.
    pub fn apply(self, parent: &mut Parent) {
        if let Some(kind) = self.kind {
            parent.kind = kind;
        }
        if let Some(name) = self.name {
            parent.name = name;
        }
        if let Some(nationality) = self.nationality {
            parent.nationality = nationality;
        }
        if let Some(alive) = self.alive {
            parent.alive = alive;
        }

        parent.birth_place = self.birth_place.or(parent.birth_place.take());
        parent.birth_date = self.birth_date.or(parent.birth_date);
        parent.last_education = self.last_education.or(parent.last_education.take());
        parent.occupation = self.occupation.or(parent.occupation.take());
        parent.monthly_income = self.monthly_income.or(parent.monthly_income);
        parent.address = self.address.or(parent.address.take());
        parent.phone = self.phone.or(parent.phone.take());
    }
}
