use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::types::GradingStatus;
use crate::schemas::grading::{
    AddCommentRequest, CommentResponse, DispatchResponse, GradingActionResponse,
    OpenResponseRequest, ProgressResponse, RecordAnswerRequest, ResponseDto,
};

pub(super) async fn open_response(
    Path(worksheet_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<OpenResponseRequest>,
) -> Result<(StatusCode, Json<ResponseDto>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let response = state
        .grading()
        .open_response(&worksheet_id, payload.submission_id.trim(), payload.student_id.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(ResponseDto::from(response))))
}

pub(super) async fn list_progress(
    Path(response_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProgressResponse>>, ApiError> {
    let snapshots = state.grading().response_progress(&response_id).await?;
    Ok(Json(snapshots.into_iter().map(ProgressResponse::from).collect()))
}

pub(super) async fn record_answer(
    Path((response_id, question_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(payload): Json<RecordAnswerRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let snapshot =
        state.grading().record_answer(&response_id, &question_id, &payload.answer).await?;
    Ok(Json(ProgressResponse::from(snapshot)))
}

pub(super) async fn submit_response(
    Path(response_id): Path<String>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<DispatchResponse>), ApiError> {
    let summary = state.grading().submit_response(&response_id).await?;
    Ok((StatusCode::ACCEPTED, Json(DispatchResponse::new(response_id, summary))))
}

pub(super) async fn dispatch_grading(
    Path(response_id): Path<String>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<DispatchResponse>), ApiError> {
    let summary = state.grading().dispatch_grading(&response_id).await?;
    Ok((StatusCode::ACCEPTED, Json(DispatchResponse::new(response_id, summary))))
}

pub(super) async fn cancel_grading(
    Path((response_id, progress_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<GradingActionResponse>, ApiError> {
    state.grading().cancel_grading(&response_id, &progress_id).await?;
    Ok(Json(GradingActionResponse {
        response_id,
        progress_id,
        status: GradingStatus::Cancelled,
    }))
}

pub(super) async fn regrade_grading(
    Path((response_id, progress_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<GradingActionResponse>), ApiError> {
    state.grading().regrade_grading(&response_id, &progress_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(GradingActionResponse { response_id, progress_id, status: GradingStatus::Pending }),
    ))
}

pub(super) async fn add_comment(
    Path((response_id, progress_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be blank".to_string()));
    }

    let comment = state
        .grading()
        .add_comment(&response_id, &progress_id, payload.author_id.trim(), payload.content.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}
