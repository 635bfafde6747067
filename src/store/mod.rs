//! Record store abstraction for student persistence.
//!
//! `StudentStore` is the seam between the lifecycle rules and the backing
//! database. Single-statement operations live on the store itself; anything
//! that reads before it writes goes through a `StudentTransaction` obtained
//! from `begin()`. A transaction that is dropped without `commit()` is rolled
//! back, so every exit path releases it.
//!
//! Email uniqueness is enforced by the store on every insert and replace and
//! surfaces as `StoreError::DuplicateEmail`, whatever checks the caller made
//! beforehand.

mod memory;
mod postgres;

pub use memory::MemoryStudentStore;
pub use postgres::PgStudentStore;

use crate::error::StoreError;
use crate::model::{PageRequest, Student, StudentFields, StudentPage};
use async_trait::async_trait;

#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Open a unit of work for a multi-step operation.
    async fn begin(&self) -> Result<Box<dyn StudentTransaction>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Student>, StoreError>;

    /// All students ordered by id.
    async fn list_all(&self) -> Result<Vec<Student>, StoreError>;

    /// Students with exactly this department, ordered by first name then id.
    async fn list_by_department(&self, department: &str) -> Result<Vec<Student>, StoreError>;

    /// One page of `list_by_department` plus the total match count.
    async fn page_by_department(&self, department: &str, page: PageRequest) -> Result<StudentPage, StoreError>;

    /// Students with `active = true`, ordered by id.
    async fn list_active(&self) -> Result<Vec<Student>, StoreError>;

    /// Case-insensitive substring match on first or last name, ordered by id.
    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Student>, StoreError>;

    /// Students in `year` with `cgpa >= min_cgpa`, ordered by id.
    async fn list_top_performing(&self, year: i32, min_cgpa: f64) -> Result<Vec<Student>, StoreError>;

    /// Set the status flag. Returns the updated row, or None when `id` is absent.
    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Student>, StoreError>;

    /// Hard delete. Returns false when `id` is absent.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Cheap liveness probe used by the readiness route.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait StudentTransaction: Send {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Student>, StoreError>;

    /// Whether another student already holds `email` (exact match).
    /// `exclude_id` leaves that record out of the check.
    async fn email_taken(&mut self, email: &str, exclude_id: Option<i64>) -> Result<bool, StoreError>;

    /// Insert a new row; the store assigns id and timestamps.
    async fn insert(&mut self, fields: &StudentFields, active: bool) -> Result<Student, StoreError>;

    /// Overwrite every mutable field of `id`, leaving `active` alone.
    /// Returns None when `id` is absent.
    async fn replace(&mut self, id: i64, fields: &StudentFields) -> Result<Option<Student>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
