//! Student records.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::model::{Page, PageRequest, SortDirection};
use crate::router::{Path, Query, Valid};
use crate::student::{
    DEFAULT_NATIONALITY, NewStudent, Student, StudentChanges, StudentDetail,
    StudentQuery, StudentSort,
};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateBody {
    #[validate(length(
        min = 1,
        max = 20,
        message = "Registration number must be 1 to 20 characters long."
    ))]
    pub registration_number: String,
    #[validate(custom(
        function = "crate::router::validate_nisn",
        message = "NISN must be 10 digits."
    ))]
    pub nisn: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Full name must be 1 to 100 characters long."
    ))]
    pub full_name: String,
    #[validate(length(max = 50, message = "Nickname must be at most 50 characters long."))]
    pub nickname: Option<String>,
    #[validate(custom(
        function = "crate::router::validate_gender",
        message = "Gender must be 'L' or 'P'."
    ))]
    pub gender: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Birth place must be 1 to 100 characters long."
    ))]
    pub birth_place: String,
    pub birth_date: NaiveDate,
    #[validate(length(
        min = 1,
        max = 20,
        message = "Religion must be 1 to 20 characters long."
    ))]
    pub religion: String,
    #[validate(range(min = 1, message = "Child order starts at 1."))]
    pub child_order: Option<i32>,
    #[validate(range(min = 0, message = "Siblings must not be negative."))]
    pub siblings: Option<i32>,
    #[validate(length(max = 50))]
    pub nationality: Option<String>,
    #[validate(length(max = 50))]
    pub home_language: Option<String>,
}

impl From<CreateBody> for NewStudent {
    fn from(body: CreateBody) -> Self {
        NewStudent {
            registration_number: body.registration_number,
            nisn: body.nisn,
            full_name: body.full_name,
            nickname: body.nickname,
            gender: body.gender,
            birth_place: body.birth_place,
            birth_date: body.birth_date,
            religion: body.religion,
            child_order: body.child_order.unwrap_or(1),
            siblings: body.siblings.unwrap_or(0),
            nationality: body
                .nationality
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NATIONALITY.into()),
            home_language: body
                .home_language
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NATIONALITY.into()),
        }
    }
}

/// Handler of `POST /students`.
pub async fn create(
    State(state): State<AppState>,
    Valid(body): Valid<CreateBody>,
) -> Result<(StatusCode, Json<Student>)> {
    let student = state.students.create(body.into()).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<StudentSort>,
    pub sort_dir: Option<SortDirection>,
}

/// Handler of `GET /students`.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Student>>> {
    let query = StudentQuery {
        search: query
            .search
            .map(|search| search.trim().to_owned())
            .filter(|search| !search.is_empty()),
        sort_by: query.sort_by.unwrap_or_default(),
        sort_dir: query.sort_dir.unwrap_or_default(),
        page: PageRequest::new(query.page, query.page_size),
    };

    Ok(Json(state.students.list(&query).await?))
}

/// Handler of `GET /students/{id}`.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StudentDetail>> {
    Ok(Json(state.students.detail(id).await?))
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBody {
    #[validate(length(min = 1, max = 20))]
    pub registration_number: Option<String>,
    #[validate(custom(
        function = "crate::router::validate_nisn",
        message = "NISN must be 10 digits."
    ))]
    pub nisn: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(max = 50))]
    pub nickname: Option<String>,
    #[validate(custom(
        function = "crate::router::validate_gender",
        message = "Gender must be 'L' or 'P'."
    ))]
    pub gender: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 20))]
    pub religion: Option<String>,
    #[validate(range(min = 1))]
    pub child_order: Option<i32>,
    #[validate(range(min = 0))]
    pub siblings: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub nationality: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub home_language: Option<String>,
}

impl From<UpdateBody> for StudentChanges {
    fn from(body: UpdateBody) -> Self {
        StudentChanges {
            registration_number: body.registration_number,
            nisn: body.nisn,
            full_name: body.full_name,
            nickname: body.nickname,
            gender: body.gender,
            birth_place: body.birth_place,
            birth_date: body.birth_date,
            religion: body.religion,
            child_order: body.child_order,
            siblings: body.siblings,
            nationality: body.nationality,
            home_language: body.home_language,
        }
    }
}

/// Handler of `PUT /students/{id}`.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Valid(body): Valid<UpdateBody>,
) -> Result<Json<Student>> {
    Ok(Json(state.students.update(id, body.into()).await?))
}

/// Handler of `DELETE /students/{id}`.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.students.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{Value, json};

    use super::*;
    use crate::{admin_token, app, body_json, make_request, test_state};

    fn student(number: &str, nisn: &str, name: &str) -> String {
        json!({
            "registration_number": number,
            "nisn": nisn,
            "full_name": name,
            "gender": "P",
            "birth_place": "Surabaya",
            "birth_date": "2008-01-31",
            "religion": "Islam",
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_crud() {
        let state = test_state().await;
        let token = admin_token(&state).await;
        let app = app(state);

        let response = make_request(
            Some(&token),
            app.clone(),
            Method::POST,
            "/api/v1/students",
            student("2024001", "0051234567", "Siti Aminah"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Student = body_json(response).await;
        assert_eq!(created.nationality, DEFAULT_NATIONALITY);
        assert_eq!(created.child_order, 1);

        let path = format!("/api/v1/students/{}", created.id);
        let response = make_request(
            Some(&token),
            app.clone(),
            Method::PUT,
            &path,
            json!({ "nickname": "Siti" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated: Student = body_json(response).await;
        assert_eq!(updated.nickname.as_deref(), Some("Siti"));
        assert_eq!(updated.full_name, "Siti Aminah");

        let response =
            make_request(Some(&token), app.clone(), Method::GET, &path, String::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let detail: Value = body_json(response).await;
        assert_eq!(detail["nisn"], "0051234567");
        assert_eq!(detail["parents"], json!([]));

        let response =
            make_request(Some(&token), app.clone(), Method::DELETE, &path, String::new()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = make_request(Some(&token), app, Method::GET, &path, String::new()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_nisn() {
        let state = test_state().await;
        let token = admin_token(&state).await;
        let app = app(state);

        let response = make_request(
            Some(&token),
            app.clone(),
            Method::POST,
            "/api/v1/students",
            student("2024001", "0051234567", "Siti"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = make_request(
            Some(&token),
            app,
            Method::POST,
            "/api/v1/students",
            student("2024002", "0051234567", "Rina"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = body_json(response).await;
        assert_eq!(body["detail"], "NISN already exists");
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let state = test_state().await;
        let token = admin_token(&state).await;
        let app = app(state);

        let response = make_request(
            Some(&token),
            app.clone(),
            Method::POST,
            "/api/v1/students",
            student("2024001", "12345", "Siti"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = body_json(response).await;
        assert_eq!(body["errors"][0]["field"], "nisn");
        assert_eq!(body["errors"][0]["message"], "NISN must be 10 digits.");

        let mut invalid_date: Value =
            serde_json::from_str(&student("2024001", "0051234567", "Siti")).unwrap();
        invalid_date["birth_date"] = json!("31-01-2008");
        let response = make_request(
            Some(&token),
            app.clone(),
            Method::POST,
            "/api/v1/students",
            invalid_date.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = make_request(
            Some(&token),
            app,
            Method::GET,
            "/api/v1/students/abc",
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_escaped_name_is_checked_again() {
        let state = test_state().await;
        let token = admin_token(&state).await;
        let app = app(state);

        // Fits before escaping, 104 characters after.
        let name = format!("O'{}", "a".repeat(98));
        for (nisn, name) in [("0051234567", name.as_str()), ("0051234568", "   ")] {
            let response = make_request(
                Some(&token),
                app.clone(),
                Method::POST,
                "/api/v1/students",
                student("2024001", nisn, name),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body: Value = body_json(response).await;
            assert_eq!(body["errors"][0]["field"], "full_name");
        }

        let response = make_request(
            Some(&token),
            app,
            Method::GET,
            "/api/v1/students",
            String::new(),
        )
        .await;
        let page: Page<Student> = body_json(response).await;
        assert_eq!(page.pagination.total_items, 0);
    }

    #[tokio::test]
    async fn test_list_pagination_and_sort() {
        let state = test_state().await;
        let token = admin_token(&state).await;
        let app = app(state);

        for (number, nisn, name) in [
            ("2024001", "0051234567", "Citra"),
            ("2024002", "0051234568", "Ahmad"),
            ("2024003", "0051234569", "Budi"),
        ] {
            let response = make_request(
                Some(&token),
                app.clone(),
                Method::POST,
                "/api/v1/students",
                student(number, nisn, name),
            )
            .await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = make_request(
            Some(&token),
            app.clone(),
            Method::GET,
            "/api/v1/students?sort_by=full_name&sort_dir=asc&page=0&page_size=2",
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let page: Page<Student> = body_json(response).await;
        let names: Vec<_> = page.data.iter().map(|s| s.full_name.as_str()).collect();
        assert_eq!(names, ["Ahmad", "Budi"]);
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.total_items, 3);
        assert_eq!(page.pagination.total_pages, 2);

        let response = make_request(
            Some(&token),
            app.clone(),
            Method::GET,
            "/api/v1/students?search=citra&page_size=1000",
            String::new(),
        )
        .await;
        let page: Page<Student> = body_json(response).await;
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.pagination.page_size, 20);

        // Only known columns can be used to sort.
        let response = make_request(
            Some(&token),
            app,
            Method::GET,
            "/api/v1/students?sort_by=password_hash",
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
