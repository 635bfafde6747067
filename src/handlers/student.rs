//! Student HTTP handlers: translate requests into lifecycle calls and wrap results.

use crate::error::AppError;
use crate::model::{PageRequest, Student, StudentInput, StudentPage};
use crate::response::{success_created, success_message, success_ok};
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: '{}'", id_str)))
}

fn body(payload: Result<Json<StudentInput>, JsonRejection>) -> Result<StudentInput, AppError> {
    payload
        .map(|Json(input)| input)
        .map_err(|e| AppError::BadRequest(format!("malformed request body: {}", e.body_text())))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(p)| p)
        .map_err(|e| AppError::BadRequest(format!("invalid query parameters: {}", e.body_text())))
}

#[derive(Debug, Deserialize)]
pub struct DepartmentParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TopPerformingParams {
    pub year: i32,
    #[serde(rename = "minCgpa")]
    pub min_cgpa: f64,
}

/// Department listing: the whole list, or one page when paging was requested.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DepartmentListing {
    All(Vec<Student>),
    Page(StudentPage),
}

/// POST /students
pub async fn create(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<StudentInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let student = state
        .students
        .create(body(payload)?)
        .await
        .map_err(|e| e.at_path(uri.path()))?;
    Ok(success_created(student, "Student created successfully"))
}

/// GET /students/:id
pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let student = state.students.get_by_id(parse_id(&id_str)?).await?;
    Ok(success_ok(student, "Student retrieved successfully"))
}

/// GET /students
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let students = state.students.list_all().await?;
    Ok(success_ok(students, "Students retrieved successfully"))
}

/// PUT /students/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<StudentInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let student = state
        .students
        .update(id, body(payload)?)
        .await
        .map_err(|e| e.at_path(uri.path()))?;
    Ok(success_ok(student, "Student updated successfully"))
}

/// DELETE /students/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.students.delete(parse_id(&id_str)?).await?;
    Ok(success_message("Student deleted successfully"))
}

/// GET /students/department/:department[?page&size]
pub async fn by_department(
    State(state): State<AppState>,
    Path(department): Path<String>,
    params: Result<Query<DepartmentParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let params = query(params)?;
    let listing = match (params.page, params.size) {
        (None, None) => DepartmentListing::All(state.students.list_by_department(&department).await?),
        (page, size) => {
            let request = PageRequest {
                page: page.unwrap_or(0),
                size: size.unwrap_or(PageRequest::DEFAULT_SIZE),
            };
            DepartmentListing::Page(state.students.page_by_department(&department, request).await?)
        }
    };
    Ok(success_ok(listing, "Students retrieved successfully"))
}

/// GET /students/search?name=
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let params = query(params)?;
    let students = state.students.search_by_name(&params.name).await?;
    Ok(success_ok(students, "Search completed successfully"))
}

/// PATCH|PUT /students/:id/deactivate
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let student = state.students.deactivate(parse_id(&id_str)?).await?;
    Ok(success_ok(student, "Student deactivated successfully"))
}

/// PATCH /students/:id/activate
pub async fn activate(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let student = state.students.activate(parse_id(&id_str)?).await?;
    Ok(success_ok(student, "Student activated successfully"))
}

/// GET /students/active
pub async fn active(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let students = state.students.list_active().await?;
    Ok(success_ok(students, "Active students retrieved successfully"))
}

/// GET /students/top-performing?year=&minCgpa=
pub async fn top_performing(
    State(state): State<AppState>,
    params: Result<Query<TopPerformingParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let params = query(params)?;
    let students = state.students.list_top_performing(params.year, params.min_cgpa).await?;
    Ok(success_ok(students, "Top performing students retrieved successfully"))
}
