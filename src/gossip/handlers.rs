use axum::{Json, extract::Extension};
use std::sync::Arc;

use crate::node::KvsNode;
use crate::storage::protocol::{GossipRequest, GossipResponse};

pub async fn handle_gossip(
    Extension(node): Extension<Arc<KvsNode>>,
    Json(req): Json<GossipRequest>,
) -> Json<GossipResponse> {
    Json(node.apply_gossip(req))
}
