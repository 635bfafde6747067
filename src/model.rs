//! Student record types: stored row, request input, validated fields, pages.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A persisted student. `id` and timestamps are assigned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: NaiveDate,
    pub department: String,
    #[sqlx(rename = "academic_year")]
    pub year: i32,
    pub cgpa: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for create and update. Every field is optional so that a
/// missing value is reported per field rather than as a decode failure.
/// `id`, `createdAt` and `updatedAt` are not client-writable and are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub department: Option<String>,
    #[serde(alias = "academicYear")]
    pub year: Option<i32>,
    pub cgpa: Option<f64>,
    /// Honoured by create only.
    pub active: Option<bool>,
}

/// The validated mutable field set. Update replaces all of these at once.
#[derive(Clone, Debug, PartialEq)]
pub struct StudentFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: NaiveDate,
    pub department: String,
    pub year: i32,
    pub cgpa: f64,
}

impl Student {
    /// Case-insensitive substring match on first or last name.
    pub fn name_contains(&self, fragment: &str) -> bool {
        let fragment = fragment.to_lowercase();
        self.first_name.to_lowercase().contains(&fragment)
            || self.last_name.to_lowercase().contains(&fragment)
    }

    pub fn fields(&self) -> StudentFields {
        StudentFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            date_of_birth: self.date_of_birth,
            department: self.department.clone(),
            year: self.year,
            cgpa: self.cgpa,
        }
    }

    /// Overwrite every mutable field; `id`, `active` and `created_at` are kept.
    pub(crate) fn apply(&mut self, fields: &StudentFields) {
        self.first_name = fields.first_name.clone();
        self.last_name = fields.last_name.clone();
        self.email = fields.email.clone();
        self.phone = fields.phone.clone();
        self.date_of_birth = fields.date_of_birth;
        self.department = fields.department.clone();
        self.year = fields.year;
        self.cgpa = fields.cgpa;
    }
}

/// Zero-based page request. Results are ordered by first name ascending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 5;
    pub const MAX_SIZE: u32 = 1000;

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPage {
    pub content: Vec<Student>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl StudentPage {
    pub fn new(content: Vec<Student>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size.max(1));
        StudentPage {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }
}
