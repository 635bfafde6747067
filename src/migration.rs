//! Database bootstrap: create the database if missing, then the students table.

use crate::error::AppError;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

pub const STUDENTS_TABLE: &str = "students";

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Schema-qualified, quoted students table name (e.g. `"public"."students"`).
pub fn qualified_students_table(schema: &str) -> String {
    format!("{}.{}", quote(schema), quote(STUDENTS_TABLE))
}

/// Create the schema, the students table and its indexes. Idempotent.
/// The unique constraint on email is what guarantees uniqueness under concurrent writers.
pub async fn ensure_students_table(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote(schema)))
        .execute(pool)
        .await?;

    let table = qualified_students_table(schema);
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id BIGSERIAL PRIMARY KEY,
            first_name VARCHAR(50) NOT NULL,
            last_name VARCHAR(50) NOT NULL,
            email TEXT NOT NULL,
            phone VARCHAR(15),
            date_of_birth DATE NOT NULL,
            department TEXT NOT NULL,
            academic_year INTEGER NOT NULL CHECK (academic_year >= 1),
            cgpa DOUBLE PRECISION NOT NULL CHECK (cgpa >= 0.0 AND cgpa <= 10.0),
            active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT students_email_key UNIQUE (email)
        )
        "#,
        table
    );
    sqlx::query(&ddl).execute(pool).await?;

    for (name, columns) in [
        ("students_department_idx", "department, first_name"),
        ("students_year_cgpa_idx", "academic_year, cgpa"),
    ] {
        let sql = format!("CREATE INDEX IF NOT EXISTS {} ON {} ({})", quote(name), table, columns);
        sqlx::query(&sql).execute(pool).await?;
    }
    tracing::info!(table = %table, "students table ready");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url.rfind('/').ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let mut parts = path_and_query.splitn(2, '?');
    let db_name = parts.next().unwrap_or("").trim().to_string();
    let query = parts.next().map(|q| format!("?{}", q)).unwrap_or_default();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres{}", base, query), db_name))
}
