use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use timetable_solver::server::router;

fn config() -> Value {
    json!({
        "workingDays": ["Mon", "Tue"],
        "dayStart": "8:00 am",
        "dayEnd": "12pm",
        "slotLengthMinutes": 60,
        "rooms": [{"id": "R1"}],
        "teachers": [{"id": "T1"}, {"id": "T2", "subjects": ["art"]}],
        "subjects": [
            {"id": "math", "name": "Mathematics", "class": "A", "sessionsPerWeek": 2, "teacher": "T1"},
            {"id": "art", "class": "A", "sessionsPerWeek": 2}
        ],
        "timetableNames": ["Week A"]
    })
}

async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn generate_returns_named_timetables() {
    let (status, body) = post(
        "/v1/timetable/generate",
        json!({"config": config(), "attempts": 2, "seed": 7}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["name"], "Week A");
    assert_eq!(results[1]["name"], "TT_2");
    for result in results {
        assert_eq!(result["status"], "Complete");
        assert_eq!(result["timetable"]["sessions"].as_array().unwrap().len(), 4);
        assert!(result["unplaced"].as_array().unwrap().is_empty());
    }
    // art names no teacher and goes to the one qualified for it
    let art = results[0]["timetable"]["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["subject"] == "art")
        .unwrap();
    assert_eq!(art["teacher"], "T2");
    assert_eq!(results[0]["timetable"]["sessions"][0]["start"].as_str().unwrap().len(), 5);
}

#[tokio::test]
async fn generate_rejects_invalid_config() {
    let mut config = config();
    config["rooms"] = json!([]);
    config["subjects"][0]["teacher"] = json!("T9");
    let (status, body) = post("/v1/timetable/generate", json!({"config": config})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.len() >= 2);
    assert!(errors.iter().any(|e| e.as_str().unwrap().contains("T9")));
}

#[tokio::test]
async fn generate_caps_attempts() {
    let (status, body) = post(
        "/v1/timetable/generate",
        json!({"config": config(), "attempts": 1000}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn validate_reports_problems_without_generating() {
    let (status, body) = post("/v1/timetable/validate", config()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"valid": true, "errors": []}));

    let mut broken = config();
    broken["slotLengthMinutes"] = json!(0);
    let (status, body) = post("/v1/timetable/validate", broken).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert!(!body["errors"].as_array().unwrap().is_empty());
}
