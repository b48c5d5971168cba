use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::core::state::AppState;

mod handlers;

#[cfg(test)]
mod tests;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_exam).get(handlers::list_exams))
        .route(
            "/:exam_id",
            get(handlers::get_exam).put(handlers::update_exam).delete(handlers::delete_exam),
        )
        .route(
            "/:exam_id/assignments",
            post(handlers::assign_exam).get(handlers::list_assignments),
        )
        .route("/:exam_id/assignments/:user_id", delete(handlers::unassign_exam))
        .route("/:exam_id/results", get(handlers::list_results))
}
