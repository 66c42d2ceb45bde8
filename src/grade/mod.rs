mod repository;
mod service;

pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};

/// Subject of the curriculum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id: i64,
    pub code: String,
    pub name: String,
    /// `A`, `B` or `C`.
    #[sqlx(rename = "subject_group")]
    pub group: String,
    pub subgroup: Option<String>,
    pub active: bool,
}

/// Knowledge and skill scores of a student for one subject and semester.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SemesterGrade {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    pub subject_code: String,
    pub subject_name: String,
    /// `X`, `XI` or `XII`.
    pub class: String,
    pub semester: i32,
    pub academic_year: String,
    pub knowledge_score: i32,
    pub knowledge_grade: Option<String>,
    pub knowledge_description: Option<String>,
    pub skill_score: i32,
    pub skill_grade: Option<String>,
    pub skill_description: Option<String>,
}

/// Grade waiting to be inserted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewGrade {
    pub subject_id: i64,
    pub class: String,
    pub semester: i32,
    pub academic_year: String,
    pub knowledge_score: i32,
    pub knowledge_grade: Option<String>,
    pub knowledge_description: Option<String>,
    pub skill_score: i32,
    pub skill_grade: Option<String>,
    pub skill_description: Option<String>,
}

/// Filters of a grade list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GradeFilter {
    pub class: Option<String>,
    pub semester: Option<i32>,
    pub academic_year: Option<String>,
}
