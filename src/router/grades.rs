//! Subjects and semester grades.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::grade::{GradeFilter, NewGrade, SemesterGrade, Subject};
use crate::model::{Page, PageRequest};
use crate::router::{Path, Query, Valid};

/// Handler of `GET /subjects`.
pub async fn subjects(State(state): State<AppState>) -> Result<Json<Vec<Subject>>> {
    Ok(Json(state.grades.subjects().await?))
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GradeBody {
    pub subject_id: i64,
    #[validate(custom(
        function = "crate::router::validate_class",
        message = "Class must be 'X', 'XI' or 'XII'."
    ))]
    pub class: String,
    #[validate(range(min = 1, max = 2, message = "Semester must be 1 or 2."))]
    pub semester: i32,
    #[validate(length(
        min = 1,
        max = 20,
        message = "Academic year must be 1 to 20 characters long."
    ))]
    pub academic_year: String,
    #[validate(range(min = 0, max = 100, message = "Score must be between 0 and 100."))]
    pub knowledge_score: i32,
    #[validate(custom(
        function = "crate::router::validate_letter_grade",
        message = "Grade must be A, B, C or D."
    ))]
    pub knowledge_grade: Option<String>,
    pub knowledge_description: Option<String>,
    #[validate(range(min = 0, max = 100, message = "Score must be between 0 and 100."))]
    pub skill_score: i32,
    #[validate(custom(
        function = "crate::router::validate_letter_grade",
        message = "Grade must be A, B, C or D."
    ))]
    pub skill_grade: Option<String>,
    pub skill_description: Option<String>,
}

impl From<GradeBody> for NewGrade {
    fn from(body: GradeBody) -> Self {
        NewGrade {
            subject_id: body.subject_id,
            class: body.class,
            semester: body.semester,
            academic_year: body.academic_year,
            knowledge_score: body.knowledge_score,
            knowledge_grade: body.knowledge_grade,
            knowledge_description: body.knowledge_description,
            skill_score: body.skill_score,
            skill_grade: body.skill_grade,
            skill_description: body.skill_description,
        }
    }
}

/// Handler of `POST /students/{id}/grades`.
pub async fn create(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Valid(body): Valid<GradeBody>,
) -> Result<(StatusCode, Json<SemesterGrade>)> {
    let grade = state.grades.create(student_id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(grade)))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct BatchBody {
    #[validate(length(min = 1, message = "At least one grade is required."), nested)]
    pub grades: Vec<GradeBody>,
}

/// Handler of `POST /students/{id}/grades/batch`.
pub async fn create_batch(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Valid(body): Valid<BatchBody>,
) -> Result<(StatusCode, Json<Vec<SemesterGrade>>)> {
    let grades = body.grades.into_iter().map(NewGrade::from).collect();
    let grades = state.grades.create_batch(student_id, grades).await?;

    Ok((StatusCode::CREATED, Json(grades)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub class: Option<String>,
    pub semester: Option<i32>,
    pub academic_year: Option<String>,
}

/// Handler of `GET /students/{id}/grades`.
pub async fn list(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<SemesterGrade>>> {
    let filter = GradeFilter {
        class: query.class.filter(|class| !class.is_empty()),
        semester: query.semester,
        academic_year: query.academic_year.filter(|year| !year.is_empty()),
    };
    let page = PageRequest::new(query.page, query.page_size);

    Ok(Json(state.grades.list(student_id, &filter, page).await?))
}
