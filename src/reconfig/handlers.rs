use axum::{
    Json,
    extract::{Extension, Path},
};
use std::sync::Arc;

use crate::error::{KvsError, Result};
use crate::membership::types::ShardId;
use crate::node::KvsNode;
use crate::peer;
use crate::storage::protocol::{
    AckResponse, ShardInfoResponse, ShardListResponse, UpdateKeyShardRequest, UpdateViewRequest,
    ViewChangeRequest, ViewChangeResponse,
};

pub async fn handle_view_change(
    Extension(node): Extension<Arc<KvsNode>>,
    Json(req): Json<ViewChangeRequest>,
) -> Result<Json<ViewChangeResponse>> {
    let nodes = req.view.into_nodes();
    let shards = node.view_change(nodes, req.repl_factor).await?;

    Ok(Json(ViewChangeResponse {
        message: "View change successful".to_string(),
        shards,
    }))
}

pub async fn handle_update_view(
    Extension(node): Extension<Arc<KvsNode>>,
    Json(req): Json<UpdateViewRequest>,
) -> Json<AckResponse> {
    node.apply_view(req.view, req.repl_factor);
    Json(AckResponse::ok())
}

pub async fn handle_update_key_shard(
    Extension(node): Extension<Arc<KvsNode>>,
    Json(req): Json<UpdateKeyShardRequest>,
) -> Json<AckResponse> {
    node.apply_directory(req.directory);
    Json(AckResponse::ok())
}

/// Starts migration and answers right away; the sender does not wait for
/// records to move.
pub async fn handle_rearrange_keys(Extension(node): Extension<Arc<KvsNode>>) -> Json<AckResponse> {
    node.spawn_rearrange();
    Json(AckResponse::ok())
}

pub async fn handle_list_shards(Extension(node): Extension<Arc<KvsNode>>) -> Json<ShardListResponse> {
    Json(ShardListResponse {
        message: "Shard membership retrieved successfully".to_string(),
        shards: node.membership.snapshot().shard_ids(),
    })
}

pub async fn handle_shard_info(
    Extension(node): Extension<Arc<KvsNode>>,
    Path(id): Path<String>,
) -> Result<Json<ShardInfoResponse>> {
    let view = node.membership.snapshot();
    let shard = view
        .shard(&ShardId(id.clone()))
        .ok_or(KvsError::UnknownShard(id))?;

    let summary = node
        .shard_summary(&view, shard, peer::slice(node.config.request_timeout, 1))
        .await;

    Ok(Json(ShardInfoResponse {
        message: "Shard information retrieved successfully".to_string(),
        shard: summary,
    }))
}
