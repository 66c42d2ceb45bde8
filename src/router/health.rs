//! Health records and illness history.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::AppState;
use crate::error::Result;
use crate::health::{HealthRecord, Illness, NewHealthRecord, NewIllness};
use crate::router::{Path, Valid};

/// Handler of `POST /students/{id}/health-record`. Creates or replaces the
/// measurements, illnesses are kept.
pub async fn save(
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
    Valid(body): Valid<NewHealthRecord>,
) -> Result<Json<HealthRecord>> {
    Ok(Json(state.health.save(student_id, body).await?))
}

/// Handler of `POST /health-records/{id}/illnesses`.
pub async fn add_illness(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    Valid(body): Valid<NewIllness>,
) -> Result<(StatusCode, Json<Illness>)> {
    let illness = state.health.add_illness(record_id, body).await?;
    Ok((StatusCode::CREATED, Json(illness)))
}

/// Handler of `DELETE /illnesses/{id}`.
pub async fn delete_illness(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.health.delete_illness(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use serde_json::{Value, json};

    use super::*;
    use crate::database::memory::new_student;
    use crate::{admin_token, app, body_json, make_request, test_state};

    #[tokio::test]
    async fn test_health_routes() {
        let state = test_state().await;
        let token = admin_token(&state).await;
        let student = state
            .students
            .create(new_student("2024001", "0051234567", "Budi"))
            .await
            .unwrap();
        let app = app(state);

        let response = make_request(
            Some(&token),
            app.clone(),
            Method::POST,
            &format!("/api/v1/students/{}/health-record", student.id),
            json!({ "entry_weight": 52.5, "entry_height": 165.0, "blood_type": "O" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let record: HealthRecord = body_json(response).await;

        let response = make_request(
            Some(&token),
            app.clone(),
            Method::POST,
            &format!("/api/v1/health-records/{}/illnesses", record.id),
            json!({ "name": "Tifus", "year": 2019, "duration": "2 minggu" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let illness: Illness = body_json(response).await;

        let response = make_request(
            Some(&token),
            app.clone(),
            Method::GET,
            &format!("/api/v1/students/{}", student.id),
            String::new(),
        )
        .await;
        let detail: Value = body_json(response).await;
        assert_eq!(detail["health"]["blood_type"], "O");
        assert_eq!(detail["health"]["illnesses"][0]["name"], "Tifus");

        for expected in [StatusCode::NO_CONTENT, StatusCode::NOT_FOUND] {
            let response = make_request(
                Some(&token),
                app.clone(),
                Method::DELETE,
                &format!("/api/v1/illnesses/{}", illness.id),
                String::new(),
            )
            .await;
            assert_eq!(response.status(), expected);
        }

        let response = make_request(
            Some(&token),
            app,
            Method::POST,
            &format!("/api/v1/students/{}/health-record", student.id),
            json!({ "blood_type": "Z" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
