//! Student routes.
//! Static segments (`active`, `search`, `top-performing`, `department`) take precedence over `:id`.

use crate::handlers::student::{
    activate, active, by_department, create, deactivate, delete as delete_handler, list, read, search,
    top_performing, update,
};
use crate::state::AppState;
use axum::{
    routing::{get, patch},
    Router,
};

pub fn student_routes(state: AppState) -> Router {
    Router::new()
        .route("/students", get(list).post(create))
        .route("/students/active", get(active))
        .route("/students/search", get(search))
        .route("/students/top-performing", get(top_performing))
        .route("/students/department/:department", get(by_department))
        .route(
            "/students/:id",
            get(read).put(update).delete(delete_handler),
        )
        .route("/students/:id/deactivate", patch(deactivate).put(deactivate))
        .route("/students/:id/activate", patch(activate))
        .with_state(state)
}
