use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use application::{
    services::{EditMessageRequest, PostMessageRequest, RegisterParticipantRequest},
    validation::{INVALID_MESSAGE_MESSAGE, INVALID_PARTICIPANT_MESSAGE},
    HistoryLimit,
};
use domain::{Message, MessageId, Participant};

use crate::{error::ApiError, extract::CallerName, state::AppState};

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    #[serde(default)]
    name: String,
}

/// 发送与编辑共用的消息载荷，发送者来自 `user` 头
#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    to: String,
    #[serde(default)]
    text: String,
    #[serde(default, rename = "type")]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteConfirmation {
    #[serde(rename = "_id")]
    id: MessageId,
    deleted: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/participants", post(register_participant).get(list_participants))
        .route("/messages", post(post_message).get(list_messages))
        .route("/messages/{id}", put(edit_message).delete(delete_message))
        .route("/status", post(heartbeat))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// 无法解析的请求体按校验失败处理
fn rejected_body(rejection: JsonRejection, message: &str) -> ApiError {
    tracing::debug!(error = %rejection, "请求体无法解析");
    ApiError::validation("body", message)
}

async fn register_participant(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let Json(payload) =
        payload.map_err(|rejection| rejected_body(rejection, INVALID_PARTICIPANT_MESSAGE))?;

    let participant = state
        .participant_service
        .register(RegisterParticipantRequest { name: payload.name })
        .await?;

    Ok((StatusCode::CREATED, Json(participant)))
}

async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    let participants = state.participant_service.list().await?;
    Ok(Json(participants))
}

async fn post_message(
    State(state): State<AppState>,
    CallerName(from): CallerName,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let Json(payload) =
        payload.map_err(|rejection| rejected_body(rejection, INVALID_MESSAGE_MESSAGE))?;

    let message = state
        .message_service
        .post(PostMessageRequest {
            from,
            to: payload.to,
            text: payload.text,
            kind: payload.kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_messages(
    State(state): State<AppState>,
    CallerName(user): CallerName,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let limit = HistoryLimit::parse(query.limit.as_deref());

    let messages = state.message_service.history(&user, limit).await?;
    Ok(Json(messages))
}

async fn heartbeat(
    State(state): State<AppState>,
    CallerName(user): CallerName,
) -> Result<StatusCode, ApiError> {
    state.participant_service.heartbeat(&user).await?;
    Ok(StatusCode::OK)
}

async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DeleteConfirmation>), ApiError> {
    let id = state.message_service.delete(&id).await?;
    Ok((
        StatusCode::CREATED,
        Json(DeleteConfirmation { id, deleted: true }),
    ))
}

async fn edit_message(
    State(state): State<AppState>,
    CallerName(editor): CallerName,
    Path(id): Path<String>,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let Json(payload) =
        payload.map_err(|rejection| rejected_body(rejection, INVALID_MESSAGE_MESSAGE))?;

    let message = state
        .message_service
        .edit(EditMessageRequest {
            message_id: id,
            editor,
            to: payload.to,
            text: payload.text,
            kind: payload.kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}
