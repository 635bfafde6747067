//! In-memory implementation of `StudentStore`.
//!
//! Rows live in a `BTreeMap` behind a `tokio` mutex. A transaction holds the
//! lock for its whole lifetime and works on a private copy of the table that
//! replaces the shared one on commit. Ids come from a counter outside the
//! table, so a rolled-back insert never hands its id out again.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{StudentStore, StudentTransaction};
use crate::error::StoreError;
use crate::model::{PageRequest, Student, StudentFields, StudentPage};

type Table = BTreeMap<i64, Student>;

pub struct MemoryStudentStore {
    rows: Arc<Mutex<Table>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryStudentStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    async fn select<F>(&self, keep: F) -> Vec<Student>
    where
        F: Fn(&Student) -> bool,
    {
        let rows = self.rows.lock().await;
        rows.values().filter(|s| keep(*s)).cloned().collect()
    }

    async fn department_sorted(&self, department: &str) -> Vec<Student> {
        let mut out = self.select(|s| s.department == department).await;
        out.sort_by(|a, b| a.first_name.cmp(&b.first_name).then(a.id.cmp(&b.id)));
        out
    }
}

impl Default for MemoryStudentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn email_held_by_other(rows: &Table, email: &str, exclude_id: Option<i64>) -> bool {
    rows.values().any(|s| s.email == email && Some(s.id) != exclude_id)
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn begin(&self) -> Result<Box<dyn StudentTransaction>, StoreError> {
        let guard = self.rows.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            staged,
            next_id: self.next_id.clone(),
        }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Student>, StoreError> {
        let rows = self.rows.lock().await;
        Ok(rows.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Student>, StoreError> {
        Ok(self.select(|_| true).await)
    }

    async fn list_by_department(&self, department: &str) -> Result<Vec<Student>, StoreError> {
        Ok(self.department_sorted(department).await)
    }

    async fn page_by_department(&self, department: &str, page: PageRequest) -> Result<StudentPage, StoreError> {
        let all = self.department_sorted(department).await;
        let total = all.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let content = all.into_iter().skip(offset).take(page.size as usize).collect();
        Ok(StudentPage::new(content, page, total))
    }

    async fn list_active(&self) -> Result<Vec<Student>, StoreError> {
        Ok(self.select(|s| s.active).await)
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Student>, StoreError> {
        Ok(self.select(|s| s.name_contains(fragment)).await)
    }

    async fn list_top_performing(&self, year: i32, min_cgpa: f64) -> Result<Vec<Student>, StoreError> {
        Ok(self.select(|s| s.year == year && s.cgpa >= min_cgpa).await)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Student>, StoreError> {
        let mut rows = self.rows.lock().await;
        Ok(rows.get_mut(&id).map(|s| {
            s.active = active;
            s.updated_at = Utc::now();
            s.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().await;
        Ok(rows.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Table>,
    staged: Table,
    next_id: Arc<AtomicI64>,
}

#[async_trait]
impl StudentTransaction for MemoryTransaction {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Student>, StoreError> {
        Ok(self.staged.get(&id).cloned())
    }

    async fn email_taken(&mut self, email: &str, exclude_id: Option<i64>) -> Result<bool, StoreError> {
        Ok(email_held_by_other(&self.staged, email, exclude_id))
    }

    async fn insert(&mut self, fields: &StudentFields, active: bool) -> Result<Student, StoreError> {
        if email_held_by_other(&self.staged, &fields.email, None) {
            return Err(StoreError::DuplicateEmail(fields.email.clone()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let student = Student {
            id,
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            date_of_birth: fields.date_of_birth,
            department: fields.department.clone(),
            year: fields.year,
            cgpa: fields.cgpa,
            active,
            created_at: now,
            updated_at: now,
        };
        self.staged.insert(id, student.clone());
        Ok(student)
    }

    async fn replace(&mut self, id: i64, fields: &StudentFields) -> Result<Option<Student>, StoreError> {
        if !self.staged.contains_key(&id) {
            return Ok(None);
        }
        if email_held_by_other(&self.staged, &fields.email, Some(id)) {
            return Err(StoreError::DuplicateEmail(fields.email.clone()));
        }
        Ok(self.staged.get_mut(&id).map(|s| {
            s.apply(fields);
            s.updated_at = Utc::now();
            s.clone()
        }))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, staged, .. } = *self;
        *guard = staged;
        Ok(())
    }
}
