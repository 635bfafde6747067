//! Student lifecycle: creation, full replace, status transitions and removal.
//!
//! Validation runs before the store is touched. The email pre-check inside
//! create/update is advisory: two writers can both pass it, and the loser is
//! caught by the store's unique constraint, which is reported the same way.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::config::ValidationPolicy;
use crate::error::{AppError, StoreError, DUPLICATE_EMAIL_MESSAGE};
use crate::model::{PageRequest, Student, StudentInput, StudentPage};
use crate::service::validation;
use crate::store::StudentStore;

#[derive(Clone)]
pub struct StudentService {
    store: Arc<dyn StudentStore>,
    policy: ValidationPolicy,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Student not found with id : '{}'", id))
}

/// The conflicting address stays out of the log; `id` is the student being
/// updated, if any.
fn duplicate(id: Option<i64>) -> AppError {
    tracing::warn!(id = ?id, "rejected duplicate email");
    AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.into())
}

/// Store failures, with a unique-constraint hit reported as a duplicate.
fn from_store(err: StoreError) -> AppError {
    match err {
        StoreError::DuplicateEmail(_) => duplicate(None),
        other => other.into(),
    }
}

impl StudentService {
    pub fn new(store: Arc<dyn StudentStore>, policy: ValidationPolicy) -> Self {
        StudentService { store, policy }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    pub async fn create(&self, input: StudentInput) -> Result<Student, AppError> {
        self.create_on(input, Self::today()).await
    }

    /// `create` with an explicit reference date for the date-of-birth rule.
    pub async fn create_on(&self, input: StudentInput, today: NaiveDate) -> Result<Student, AppError> {
        let active = input.active.unwrap_or(true);
        let fields = validation::into_fields(input, &self.policy, today)?;

        let mut tx = self.store.begin().await.map_err(from_store)?;
        if tx.email_taken(&fields.email, None).await.map_err(from_store)? {
            return Err(duplicate(None));
        }
        let student = tx.insert(&fields, active).await.map_err(from_store)?;
        tx.commit().await.map_err(from_store)?;

        tracing::info!(id = student.id, "student created");
        Ok(student)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Student, AppError> {
        self.store.find_by_id(id).await.map_err(from_store)?.ok_or_else(|| not_found(id))
    }

    pub async fn list_all(&self) -> Result<Vec<Student>, AppError> {
        Ok(self.store.list_all().await?)
    }

    /// Every student in `department`, ordered by first name.
    pub async fn list_by_department(&self, department: &str) -> Result<Vec<Student>, AppError> {
        Ok(self.store.list_by_department(department).await?)
    }

    pub async fn page_by_department(&self, department: &str, page: PageRequest) -> Result<StudentPage, AppError> {
        if page.size == 0 || page.size > PageRequest::MAX_SIZE {
            return Err(AppError::BadRequest(format!(
                "size must be between 1 and {}",
                PageRequest::MAX_SIZE
            )));
        }
        Ok(self.store.page_by_department(department, page).await?)
    }

    pub async fn list_active(&self) -> Result<Vec<Student>, AppError> {
        Ok(self.store.list_active().await?)
    }

    pub async fn search_by_name(&self, fragment: &str) -> Result<Vec<Student>, AppError> {
        Ok(self.store.search_by_name(fragment.trim()).await?)
    }

    pub async fn list_top_performing(&self, year: i32, min_cgpa: f64) -> Result<Vec<Student>, AppError> {
        if !min_cgpa.is_finite() {
            return Err(AppError::BadRequest("minCgpa must be a number".into()));
        }
        Ok(self.store.list_top_performing(year, min_cgpa).await?)
    }

    pub async fn update(&self, id: i64, input: StudentInput) -> Result<Student, AppError> {
        self.update_on(id, input, Self::today()).await
    }

    /// Full replace of every mutable field. `active` is never changed here.
    pub async fn update_on(&self, id: i64, input: StudentInput, today: NaiveDate) -> Result<Student, AppError> {
        let fields = validation::into_fields(input, &self.policy, today)?;

        let mut tx = self.store.begin().await.map_err(from_store)?;
        let current = tx.find_by_id(id).await.map_err(from_store)?.ok_or_else(|| not_found(id))?;
        if current.email != fields.email && tx.email_taken(&fields.email, Some(id)).await.map_err(from_store)? {
            return Err(duplicate(Some(id)));
        }
        let student = tx
            .replace(id, &fields)
            .await
            .map_err(from_store)?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await.map_err(from_store)?;

        tracing::info!(id, "student updated");
        Ok(student)
    }

    pub async fn deactivate(&self, id: i64) -> Result<Student, AppError> {
        self.set_active(id, false).await
    }

    pub async fn activate(&self, id: i64) -> Result<Student, AppError> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Student, AppError> {
        let student = self
            .store
            .set_active(id, active)
            .await
            .map_err(from_store)?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(id, active, "student status changed");
        Ok(student)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.store.delete(id).await.map_err(from_store)? {
            return Err(not_found(id));
        }
        tracing::info!(id, "student deleted");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        Ok(self.store.ping().await?)
    }
}
