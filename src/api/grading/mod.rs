mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/worksheets/:worksheet_id/responses", post(handlers::open_response))
        .route("/responses/:response_id/progress", get(handlers::list_progress))
        .route("/responses/:response_id/answers/:question_id", put(handlers::record_answer))
        .route("/responses/:response_id/submit", post(handlers::submit_response))
        .route("/responses/:response_id/grade", post(handlers::dispatch_grading))
        .route(
            "/responses/:response_id/progress/:progress_id/cancel",
            post(handlers::cancel_grading),
        )
        .route(
            "/responses/:response_id/progress/:progress_id/regrade",
            post(handlers::regrade_grading),
        )
        .route(
            "/responses/:response_id/progress/:progress_id/comments",
            post(handlers::add_comment),
        )
}
