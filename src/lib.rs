//! Student records: a REST backend for student entities over PostgreSQL.

pub mod config;
pub mod error;
pub mod migration;
pub mod model;
pub mod response;
pub mod state;
pub mod store;
pub mod service;
pub mod handlers;
pub mod routes;

pub use config::{AppConfig, ValidationPolicy};
pub use error::{AppError, ConfigError, FieldViolation, StoreError};
pub use migration::{ensure_database_exists, ensure_students_table};
pub use model::{PageRequest, Student, StudentFields, StudentInput, StudentPage};
pub use response::{success_created, success_message, success_ok, ApiResponse};
pub use state::AppState;
pub use store::{MemoryStudentStore, PgStudentStore, StudentStore, StudentTransaction};
pub use routes::{app, common_routes_with_ready, student_routes};
pub use service::StudentService;
