//! HTTP-level tests: drive the full router against the in-memory store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use student_records::{
    app, AppState, MemoryStudentStore, PageRequest, StoreError, Student, StudentPage, StudentService,
    StudentStore, StudentTransaction, ValidationPolicy,
};
use tower::ServiceExt;

fn router() -> Router {
    let service = StudentService::new(Arc::new(MemoryStudentStore::new()), ValidationPolicy::default());
    app(AppState::new(service), 64 * 1024)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn ann() -> Value {
    json!({
        "firstName": "Ann",
        "lastName": "Lee",
        "email": "ann@x.com",
        "phone": "9876543210",
        "dateOfBirth": "2000-01-01",
        "department": "CS",
        "year": 2,
        "cgpa": 9.1
    })
}

fn student(first: &str, email: &str, department: &str, year: i64, cgpa: f64) -> Value {
    let mut v = ann();
    v["firstName"] = json!(first);
    v["email"] = json!(email);
    v["department"] = json!(department);
    v["year"] = json!(year);
    v["cgpa"] = json!(cgpa);
    v
}

async fn create(router: &Router, body: Value) -> Value {
    let (status, body) = send(router, Method::POST, "/students", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

#[tokio::test]
async fn create_returns_201_envelope_with_generated_id() {
    let router = router();
    let (status, body) = send(&router, Method::POST, "/students", Some(ann())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["status"], json!(201));
    assert!(body["timestamp"].is_string());
    assert!(body["data"]["id"].is_i64());
    assert_eq!(body["data"]["active"], json!(true));
    assert_eq!(body["data"]["dateOfBirth"], json!("2000-01-01"));
    assert_eq!(body["data"]["year"], json!(2));

    let id = body["data"]["id"].as_i64().unwrap();
    let (status, fetched) = send(&router, Method::GET, &format!("/students/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], body["data"]);
}

#[tokio::test]
async fn duplicate_email_returns_409_and_keeps_one_record() {
    let router = router();
    create(&router, ann()).await;
    let (status, body) = send(&router, Method::POST, "/students", Some(ann())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["status"], json!(409));
    assert_eq!(body["message"], json!("Email already exists"));
    assert_eq!(body["data"], Value::Null);

    let (_, all) = send(&router, Method::GET, "/students", None).await;
    let matching = all["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["email"] == json!("ann@x.com"))
        .count();
    assert_eq!(matching, 1);
}

#[tokio::test]
async fn validation_failure_returns_field_map() {
    let router = router();
    let (status, body) = send(
        &router,
        Method::POST,
        "/students",
        Some(json!({ "firstName": "A", "email": "nope", "year": 9, "cgpa": 10.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));
    assert_eq!(body["message"], json!("Validation failed"));
    assert_eq!(body["description"], json!("uri=/students"));
    let errors = body["validationErrors"].as_object().unwrap();
    for field in ["firstName", "lastName", "email", "phone", "dateOfBirth", "department", "year", "cgpa"] {
        assert!(errors.contains_key(field), "missing {field}");
    }
    assert_eq!(errors["email"], json!("Invalid email format"));

    let (_, all) = send(&router, Method::GET, "/students", None).await;
    assert!(all["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
    let router = router();
    let (status, body) = send(&router, Method::POST, "/students", Some(json!({ "cgpa": "high" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, _) = send(&router, Method::GET, "/students/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::GET, "/students/top-performing?year=3", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::GET, "/students/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_id_returns_404() {
    let router = router();
    for (method, uri) in [
        (Method::GET, "/students/41"),
        (Method::DELETE, "/students/41"),
        (Method::PATCH, "/students/41/deactivate"),
        (Method::PATCH, "/students/41/activate"),
    ] {
        let (status, body) = send(&router, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["status"], json!(404));
    }
    let (status, _) = send(&router, Method::PUT, "/students/41", Some(ann())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_replaces_fields_but_not_status() {
    let router = router();
    let created = create(&router, ann()).await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = send(&router, Method::PUT, &format!("/students/{id}/deactivate"), None).await;
    assert_eq!(status, StatusCode::OK);

    let mut replacement = student("Anne", "anne@x.com", "EE", 3, 8.0);
    replacement["active"] = json!(true);
    let (status, body) = send(&router, Method::PUT, &format!("/students/{id}"), Some(replacement)).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["id"], json!(id));
    assert_eq!(data["firstName"], json!("Anne"));
    assert_eq!(data["email"], json!("anne@x.com"));
    assert_eq!(data["department"], json!("EE"));
    assert_eq!(data["active"], json!(false));
    assert_eq!(data["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn update_to_taken_email_conflicts() {
    let router = router();
    create(&router, ann()).await;
    let bob = create(&router, student("Bob", "bob@x.com", "CS", 2, 7.0)).await;
    let id = bob["id"].as_i64().unwrap();
    let (status, _) = send(
        &router,
        Method::PUT,
        &format!("/students/{id}"),
        Some(student("Bob", "ann@x.com", "CS", 2, 7.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn deactivate_then_activate_restores_status_only() {
    let router = router();
    let created = create(&router, ann()).await;
    let id = created["id"].as_i64().unwrap();

    let (_, off) = send(&router, Method::PATCH, &format!("/students/{id}/deactivate"), None).await;
    assert_eq!(off["data"]["active"], json!(false));
    let (_, active) = send(&router, Method::GET, "/students/active", None).await;
    assert!(active["data"].as_array().unwrap().is_empty());

    let (status, on) = send(&router, Method::PATCH, &format!("/students/{id}/activate"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(on["data"]["active"], json!(true));
    for field in ["firstName", "lastName", "email", "phone", "dateOfBirth", "department", "year", "cgpa"] {
        assert_eq!(on["data"][field], created[field], "{field}");
    }
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let router = router();
    let id = create(&router, ann()).await["id"].as_i64().unwrap();
    let (status, body) = send(&router, Method::DELETE, &format!("/students/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], Value::Null);
    let (status, _) = send(&router, Method::GET, &format!("/students/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn department_listing_whole_and_paged() {
    let router = router();
    for (first, email) in [("Zoe", "z@x.com"), ("Ann", "a@x.com"), ("Mia", "m@x.com")] {
        create(&router, student(first, email, "CS", 2, 7.5)).await;
    }
    create(&router, student("Bob", "b@x.com", "EE", 2, 7.5)).await;

    let (status, body) = send(&router, Method::GET, "/students/department/CS", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["firstName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ann", "Mia", "Zoe"]);

    let (status, body) = send(&router, Method::GET, "/students/department/CS?page=1&size=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["totalElements"], json!(3));
    assert_eq!(page["totalPages"], json!(2));
    assert_eq!(page["page"], json!(1));
    assert_eq!(page["content"][0]["firstName"], json!("Zoe"));

    let (_, body) = send(&router, Method::GET, "/students/department/CS?page=0", None).await;
    assert_eq!(body["data"]["size"], json!(5));
    assert_eq!(body["data"]["content"].as_array().unwrap().len(), 3);

    let (status, _) = send(&router, Method::GET, "/students/department/CS?size=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_is_case_insensitive_on_either_name() {
    let router = router();
    create(&router, student("Annika", "annika@x.com", "CS", 2, 7.5)).await;
    let mut other = student("Bob", "bob@x.com", "CS", 2, 7.5);
    other["lastName"] = json!("Hannan");
    create(&router, other).await;
    create(&router, student("Carl", "carl@x.com", "CS", 2, 7.5)).await;

    let (status, body) = send(&router, Method::GET, "/students/search?name=ANN", None).await;
    assert_eq!(status, StatusCode::OK);
    let mut emails: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["email"].as_str().unwrap())
        .collect();
    emails.sort();
    assert_eq!(emails, vec!["annika@x.com", "bob@x.com"]);
}

#[tokio::test]
async fn top_performing_filters_by_year_and_min_cgpa() {
    let router = router();
    let cases = [(3, 8.5, true), (3, 8.4, false), (2, 9.5, false), (3, 9.9, true)];
    let mut expected = Vec::new();
    for (i, (year, cgpa, hit)) in cases.into_iter().enumerate() {
        let email = format!("s{i}@x.com");
        create(&router, student("Stu", &email, "CS", year, cgpa)).await;
        if hit {
            expected.push(email);
        }
    }
    let (status, body) = send(&router, Method::GET, "/students/top-performing?year=3&minCgpa=8.5", None).await;
    assert_eq!(status, StatusCode::OK);
    let mut got: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["email"].as_str().unwrap().to_string())
        .collect();
    got.sort();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn operational_routes_respond() {
    let router = router();
    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    let (status, body) = send(&router, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], json!("ok"));
    let (_, body) = send(&router, Method::GET, "/version", None).await;
    assert_eq!(body["name"], json!("student-records"));
}

/// A store whose backing database is unreachable.
struct UnreachableStore;

fn unreachable() -> StoreError {
    StoreError::Db(sqlx::Error::Protocol("connection refused by db-internal-7:5432".into()))
}

#[async_trait]
impl StudentStore for UnreachableStore {
    async fn begin(&self) -> Result<Box<dyn StudentTransaction>, StoreError> {
        Err(unreachable())
    }
    async fn find_by_id(&self, _id: i64) -> Result<Option<Student>, StoreError> {
        Err(unreachable())
    }
    async fn list_all(&self) -> Result<Vec<Student>, StoreError> {
        Err(unreachable())
    }
    async fn list_by_department(&self, _department: &str) -> Result<Vec<Student>, StoreError> {
        Err(unreachable())
    }
    async fn page_by_department(&self, _department: &str, _page: PageRequest) -> Result<StudentPage, StoreError> {
        Err(unreachable())
    }
    async fn list_active(&self) -> Result<Vec<Student>, StoreError> {
        Err(unreachable())
    }
    async fn search_by_name(&self, _fragment: &str) -> Result<Vec<Student>, StoreError> {
        Err(unreachable())
    }
    async fn list_top_performing(&self, _year: i32, _min_cgpa: f64) -> Result<Vec<Student>, StoreError> {
        Err(unreachable())
    }
    async fn set_active(&self, _id: i64, _active: bool) -> Result<Option<Student>, StoreError> {
        Err(unreachable())
    }
    async fn delete(&self, _id: i64) -> Result<bool, StoreError> {
        Err(unreachable())
    }
    async fn ping(&self) -> Result<(), StoreError> {
        Err(unreachable())
    }
}

#[tokio::test]
async fn store_failures_return_sanitized_500_and_not_ready() {
    let service = StudentService::new(Arc::new(UnreachableStore), ValidationPolicy::default());
    let router = app(AppState::new(service), 64 * 1024);

    for (method, uri, body) in [
        (Method::GET, "/students", None),
        (Method::GET, "/students/1", None),
        (Method::POST, "/students", Some(ann())),
        (Method::PUT, "/students/1", Some(ann())),
        (Method::DELETE, "/students/1", None),
        (Method::GET, "/students/department/CS?page=0", None),
    ] {
        let (status, body) = send(&router, method, uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["status"], json!(500));
        assert_eq!(body["message"], json!("An unexpected error occurred"));
        assert!(!body.to_string().contains("db-internal-7"), "{body}");
    }

    let (status, body) = send(&router, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], json!("degraded"));
    let (status, _) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}
