//! PostgreSQL implementation of `StudentStore` (sqlx).
//!
//! Table and column names are fixed; every value is bound as a parameter.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{StudentStore, StudentTransaction};
use crate::error::StoreError;
use crate::migration::qualified_students_table;
use crate::model::{PageRequest, Student, StudentFields, StudentPage};

const COLUMNS: &str = "id, first_name, last_name, email, phone, date_of_birth, department, \
                       academic_year, cgpa, active, created_at, updated_at";

/// Name of the unique constraint created by `ensure_students_table`.
const EMAIL_CONSTRAINT: &str = "students_email_key";

#[derive(Clone)]
pub struct PgStudentStore {
    pool: PgPool,
    table: String,
}

impl PgStudentStore {
    pub fn new(pool: PgPool, schema: &str) -> Self {
        PgStudentStore {
            pool,
            table: qualified_students_table(schema),
        }
    }

    async fn fetch_where(&self, clause: &str, order: &str, binds: Binds<'_>) -> Result<Vec<Student>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE {} ORDER BY {}", COLUMNS, self.table, clause, order);
        tracing::debug!(sql = %sql, "query");
        let mut q = sqlx::query_as::<_, Student>(&sql);
        for b in binds.0 {
            q = match b {
                Bind::Text(s) => q.bind(*s),
                Bind::Int(n) => q.bind(*n),
                Bind::Float(f) => q.bind(*f),
                Bind::Bool(v) => q.bind(*v),
            };
        }
        Ok(q.fetch_all(&self.pool).await?)
    }
}

/// Positional parameters for the read projections.
enum Bind<'a> {
    Text(&'a str),
    Int(i32),
    Float(f64),
    Bool(bool),
}

struct Binds<'a>(&'a [Bind<'a>]);

/// Escape LIKE metacharacters so the fragment matches literally.
fn like_pattern(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + 2);
    out.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Map a unique violation on the email constraint to `DuplicateEmail`.
fn classify(err: sqlx::Error, email: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        let on_email = db.constraint().map_or(true, |c| c == EMAIL_CONSTRAINT);
        if db.is_unique_violation() && on_email {
            return StoreError::DuplicateEmail(email.to_string());
        }
    }
    StoreError::Db(err)
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn begin(&self) -> Result<Box<dyn StudentTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction {
            tx,
            table: self.table.clone(),
        }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Student>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", COLUMNS, self.table);
        tracing::debug!(sql = %sql, id, "query");
        Ok(sqlx::query_as::<_, Student>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_all(&self) -> Result<Vec<Student>, StoreError> {
        self.fetch_where("TRUE", "id", Binds(&[])).await
    }

    async fn list_by_department(&self, department: &str) -> Result<Vec<Student>, StoreError> {
        self.fetch_where("department = $1", "first_name, id", Binds(&[Bind::Text(department)]))
            .await
    }

    async fn page_by_department(&self, department: &str, page: PageRequest) -> Result<StudentPage, StoreError> {
        let count_sql = format!("SELECT COUNT(*) FROM {} WHERE department = $1", self.table);
        let sql = format!(
            "SELECT {} FROM {} WHERE department = $1 ORDER BY first_name, id LIMIT $2 OFFSET $3",
            COLUMNS, self.table
        );
        tracing::debug!(sql = %sql, page = page.page, size = page.size, "query");
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        let mut conn = self.pool.acquire().await?;
        let (total,): (i64,) = sqlx::query_as(&count_sql)
            .bind(department)
            .fetch_one(&mut *conn)
            .await?;
        let content = sqlx::query_as::<_, Student>(&sql)
            .bind(department)
            .bind(i64::from(page.size))
            .bind(offset)
            .fetch_all(&mut *conn)
            .await?;
        Ok(StudentPage::new(content, page, total.max(0) as u64))
    }

    async fn list_active(&self) -> Result<Vec<Student>, StoreError> {
        self.fetch_where("active = $1", "id", Binds(&[Bind::Bool(true)])).await
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Student>, StoreError> {
        let pattern = like_pattern(fragment);
        self.fetch_where(
            "first_name ILIKE $1 OR last_name ILIKE $1",
            "id",
            Binds(&[Bind::Text(&pattern)]),
        )
        .await
    }

    async fn list_top_performing(&self, year: i32, min_cgpa: f64) -> Result<Vec<Student>, StoreError> {
        self.fetch_where(
            "academic_year = $1 AND cgpa >= $2",
            "id",
            Binds(&[Bind::Int(year), Bind::Float(min_cgpa)]),
        )
        .await
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Option<Student>, StoreError> {
        let sql = format!(
            "UPDATE {} SET active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            self.table, COLUMNS
        );
        tracing::debug!(sql = %sql, id, active, "query");
        Ok(sqlx::query_as::<_, Student>(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        tracing::debug!(sql = %sql, id, "query");
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Wraps a sqlx transaction; sqlx rolls it back when dropped uncommitted.
struct PgTransaction {
    tx: Transaction<'static, Postgres>,
    table: String,
}

#[async_trait]
impl StudentTransaction for PgTransaction {
    async fn find_by_id(&mut self, id: i64) -> Result<Option<Student>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1 FOR UPDATE", COLUMNS, self.table);
        tracing::debug!(sql = %sql, id, "query (tx)");
        Ok(sqlx::query_as::<_, Student>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?)
    }

    async fn email_taken(&mut self, email: &str, exclude_id: Option<i64>) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE email = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
            self.table
        );
        tracing::debug!(sql = %sql, "query (tx)");
        let (taken,): (bool,) = sqlx::query_as(&sql)
            .bind(email)
            .bind(exclude_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(taken)
    }

    async fn insert(&mut self, fields: &StudentFields, active: bool) -> Result<Student, StoreError> {
        let sql = format!(
            "INSERT INTO {} (first_name, last_name, email, phone, date_of_birth, department, academic_year, cgpa, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            self.table, COLUMNS
        );
        tracing::debug!(sql = %sql, "query (tx)");
        sqlx::query_as::<_, Student>(&sql)
            .bind(&fields.first_name)
            .bind(&fields.last_name)
            .bind(&fields.email)
            .bind(&fields.phone)
            .bind(fields.date_of_birth)
            .bind(&fields.department)
            .bind(fields.year)
            .bind(fields.cgpa)
            .bind(active)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| classify(e, &fields.email))
    }

    async fn replace(&mut self, id: i64, fields: &StudentFields) -> Result<Option<Student>, StoreError> {
        let sql = format!(
            "UPDATE {} SET first_name = $2, last_name = $3, email = $4, phone = $5, date_of_birth = $6, \
             department = $7, academic_year = $8, cgpa = $9, updated_at = NOW() WHERE id = $1 RETURNING {}",
            self.table, COLUMNS
        );
        tracing::debug!(sql = %sql, id, "query (tx)");
        sqlx::query_as::<_, Student>(&sql)
            .bind(id)
            .bind(&fields.first_name)
            .bind(&fields.last_name)
            .bind(&fields.email)
            .bind(&fields.phone)
            .bind(fields.date_of_birth)
            .bind(&fields.department)
            .bind(fields.year)
            .bind(fields.cgpa)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| classify(e, &fields.email))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        Ok(self.tx.commit().await?)
    }
}
