use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use timetable::config::AppConfig;
use timetable::db::TimetableDbManager;
use timetable::server::create_router;
use timetable::types::AppState;

fn app() -> Router {
    let db = TimetableDbManager::in_memory().unwrap();
    create_router(Arc::new(AppState::new(AppConfig::default(), db)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: Value, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(token) = session {
        builder = builder.header("x-session-id", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = session {
        builder = builder.header("x-session-id", token);
    }
    builder.body(Body::empty()).unwrap()
}

fn form(department: &str, faculty_id: &str, slots: &[u32]) -> Value {
    let courses: Vec<Value> = slots
        .iter()
        .enumerate()
        .map(|(i, slots)| {
            json!({
                "courseCode": format!("CS20{}", i),
                "subject": format!("Subject {}", i),
                "faculty": "Dr. Smith",
                "facultyId": faculty_id,
                "slots": slots,
                "consecutive": false,
                "consecutiveSlots": 1,
            })
        })
        .collect();

    json!({
        "department": department,
        "semester": "Semester 3",
        "block": "AB1",
        "classroom": "101",
        "courses": courses,
    })
}

fn filled_cells(timetable: &Value) -> Vec<(String, usize)> {
    let mut cells = Vec::new();
    for column in timetable["days"].as_array().unwrap() {
        let day = column["day"].as_str().unwrap().to_string();
        for (index, cell) in column["slots"].as_array().unwrap().iter().enumerate() {
            if !cell.is_null() {
                cells.push((day.clone(), index));
            }
        }
    }
    cells
}

#[tokio::test]
async fn test_health_and_grid_config() {
    let app = app();

    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, get("/config/grid", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"].as_array().unwrap().len(), 6);
    assert_eq!(body["break_index"], 3);
    assert_eq!(body["slots"][0]["timing"], "8:00 - 8:50");
}

#[tokio::test]
async fn test_generate_save_and_detect_conflicts() {
    let app = app();

    let mut request = form("CSE", "F001", &[3, 2]);
    request["seed"] = json!(7);
    let (status, body) = send(&app, post("/generate", request, Some("alice"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["unplaced"].as_array().unwrap().is_empty());
    let cells = filled_cells(&body["timetable"]);
    assert_eq!(cells.len(), 5);
    assert!(cells.iter().all(|(_, index)| *index != 3));

    // the session remembers the generated grid
    let (status, session) = send(&app, get("/session", Some("alice"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["inputs"]["department"], "CSE");
    assert_eq!(session["last_generated"]["timetable"], body["timetable"]);

    // save without resending the grid
    let save = json!({ "inputs": form("CSE", "F001", &[3, 2]) });
    let (status, saved) = send(&app, post("/timetables", save, Some("alice"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = saved["id"].as_i64().unwrap();

    let (status, listed) = send(&app, get("/timetables", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, loaded) = send(&app, get(&format!("/timetables/{}", id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["grid"], body["timetable"]);
    assert_eq!(loaded["slots"].as_array().unwrap().len(), 5);

    // every booked cell now shows up as a conflict
    let (day, index) = cells[0].clone();
    let (status, conflicts) = send(
        &app,
        get(
            &format!("/conflicts?day={}&slot={}&faculty_id=F001", day, index),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conflicts[0]["timetable"], "CSE - Semester 3 (AB1)");
    assert_eq!(conflicts[0]["slot"], index + 1);

    let (status, validation) = send(&app, post("/validate", body["timetable"].clone(), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(validation["valid"], false);
    let message = validation["conflicts"][0].as_str().unwrap();
    assert!(message.contains("F001"));
    assert!(message.contains(&day));

    // saving the same grid again for another department is refused
    let again = json!({ "inputs": form("ECE", "F001", &[3, 2]), "timetable": body["timetable"] });
    let (status, error) = send(&app, post("/timetables", again, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["details"].as_array().unwrap().len(), 5);

    // a new generation for the same faculty avoids the booked cells
    let mut request = form("ECE", "F001", &[3, 2]);
    request["seed"] = json!(7);
    let (status, second) = send(&app, post("/generate", request, None)).await;
    assert_eq!(status, StatusCode::OK);
    let second_cells = filled_cells(&second["timetable"]);
    assert_eq!(second_cells.len(), 5);
    assert!(second_cells.iter().all(|cell| !cells.contains(cell)));

    let (status, availability) = send(&app, get("/faculty/F001/availability", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["faculty_name"], "Dr. Smith");
    assert_eq!(availability["bookings"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_generate_rejects_incomplete_form() {
    let app = app();

    let mut request = form("CSE", "F001", &[3]);
    request["department"] = json!("");
    let (status, body) = send(&app, post("/generate", request, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["context"].as_str().unwrap().contains("department"));

    let request = form("CSE", "", &[3]);
    let (status, body) = send(&app, post("/generate", request, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No Valid Courses");
}

#[tokio::test]
async fn test_overload_needs_confirmation() {
    let app = app();

    let (status, body) = send(&app, post("/generate", form("CSE", "F1", &[6, 5]), None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0], "Faculty F1 has 11 slots (max 10 allowed)");

    let mut request = form("CSE", "F1", &[6, 5]);
    request["confirm_overload"] = json!(true);
    let (status, body) = send(&app, post("/generate", request, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["faculty_load"].as_array().unwrap().len(), 1);

    let courses = form("CSE", "F1", &[4, 5])["courses"].clone();
    let (status, body) =
        send(&app, post("/faculty_load", json!({ "courses": courses }), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_rendered_grid_can_be_saved() {
    let app = app();

    let cell = "Data Structures<br/><span class=\"text-xs text-gray-600\">(Dr. Smith)<br/>F001</span>";
    let mut monday = vec![json!(""); 10];
    monday[0] = json!(cell);
    monday[1] = json!("not a rendered cell");
    let save = json!({
        "inputs": form("CSE", "F001", &[1]),
        "timetable": { "Monday": monday },
    });

    let (status, saved) = send(&app, post("/timetables", save, None)).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = saved["id"].as_i64().unwrap();
    let (_, loaded) = send(&app, get(&format!("/timetables/{}", id), None)).await;
    let slots = loaded["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["subject"], "Data Structures");
    assert_eq!(slots[0]["faculty_id"], "F001");
    assert_eq!(slots[0]["slot_number"], 0);
}

#[tokio::test]
async fn test_missing_timetable_and_session() {
    let app = app();

    let (status, _) = send(&app, get("/timetables/999", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/session", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let save = json!({ "inputs": form("CSE", "F001", &[1]) });
    let (status, body) = send(&app, post("/timetables", save, Some("nobody"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No timetable to save");

    let (status, _) = send(
        &app,
        get("/conflicts?day=Sunday&slot=0&faculty_id=F001", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
