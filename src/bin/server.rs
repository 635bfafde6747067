//! Student records server: reads settings from the environment, ensures the
//! database and students table exist, then serves the REST API.

use std::sync::Arc;

use student_records::{
    app, ensure_database_exists, ensure_students_table, AppConfig, AppState, PgStudentStore, StudentService,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("student_records=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    ensure_database_exists(&config.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    ensure_students_table(&pool, &config.schema).await?;

    let store = PgStudentStore::new(pool, &config.schema);
    let students = StudentService::new(Arc::new(store), config.policy.clone());
    let router = app(AppState::new(students), config.max_body_bytes);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        max_year = config.policy.max_year,
        phone_required = config.policy.phone_required,
        "student records listening"
    );
    axum::serve(listener, router).await?;
    Ok(())
}
