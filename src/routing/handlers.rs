use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::validate_write;
use crate::node::KvsNode;
use crate::storage::protocol::{
    AckResponse, KeyCountResponse, KeyRequest, PullRecordResponse, UpdateKeyRequest,
    ValidationResponse,
};

pub async fn handle_get_key(
    Extension(node): Extension<Arc<KvsNode>>,
    Path(key): Path<String>,
    body: Option<Json<KeyRequest>>,
) -> Response {
    let request = body.map(|Json(req)| req).unwrap_or_default();

    match node.get_key(&key, request).await {
        Ok(reply) => reply.into_response(),
        Err(e) => {
            tracing::debug!("GET {} failed: {}", key, e);
            e.into_response()
        }
    }
}

pub async fn handle_put_key(
    Extension(node): Extension<Arc<KvsNode>>,
    Path(key): Path<String>,
    body: Option<Json<KeyRequest>>,
) -> Response {
    let request = body.map(|Json(req)| req).unwrap_or_default();

    match node.put_key(&key, request).await {
        Ok(reply) => reply.into_response(),
        Err(e) => {
            tracing::debug!("PUT {} failed: {}", key, e);
            e.into_response()
        }
    }
}

pub async fn handle_key_count(Extension(node): Extension<Arc<KvsNode>>) -> Json<KeyCountResponse> {
    Json(KeyCountResponse {
        message: "Key count retrieved successfully".to_string(),
        key_count: node.store.len(),
        shard_id: node.membership.self_shard(),
    })
}

pub async fn handle_update_key(
    Extension(node): Extension<Arc<KvsNode>>,
    Json(req): Json<UpdateKeyRequest>,
) -> Json<AckResponse> {
    tracing::debug!("Directory patch: {} -> {}", req.key, req.shard);
    node.directory.insert(req.key, req.shard);
    Json(AckResponse::ok())
}

pub async fn handle_validate(
    Path(key): Path<String>,
    body: Option<Json<KeyRequest>>,
) -> (StatusCode, Json<ValidationResponse>) {
    let value = body.and_then(|Json(req)| req.value);

    match validate_write(&key, value) {
        Ok(_) => (StatusCode::OK, Json(ValidationResponse { rejection: None })),
        Err(e) => (
            e.status(),
            Json(ValidationResponse {
                rejection: Some(e),
            }),
        ),
    }
}

pub async fn handle_pull_record(
    Extension(node): Extension<Arc<KvsNode>>,
    Path(key): Path<String>,
    body: Option<Json<KeyRequest>>,
) -> Json<PullRecordResponse> {
    if let Some(Json(req)) = body {
        node.tracker.observe(&req.causal_context, &key);
    }

    Json(PullRecordResponse {
        record: node.store.get(&key),
    })
}
