//! HTTP surface of a node: route table and serve loop.

use axum::{
    Router,
    extract::Extension,
    routing::{get, put},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::gossip::handlers::handle_gossip;
use crate::gossip::service::spawn_gossip;
use crate::node::KvsNode;
use crate::reconfig::handlers::*;
use crate::routing::handlers::*;
use crate::storage::protocol::*;

pub fn build_router(node: Arc<KvsNode>) -> Router {
    Router::new()
        .route(
            &format!("{}/:key", ENDPOINT_KEYS),
            get(handle_get_key).put(handle_put_key),
        )
        .route(ENDPOINT_KEY_COUNT, get(handle_key_count))
        .route(ENDPOINT_UPDATE_KEY, put(handle_update_key))
        .route(ENDPOINT_UPDATE_VIEW, put(handle_update_view))
        .route(ENDPOINT_UPDATE_KEY_SHARD, put(handle_update_key_shard))
        .route(ENDPOINT_REARRANGE_KEYS, put(handle_rearrange_keys))
        .route(&format!("{}/:key", ENDPOINT_VALIDATE), put(handle_validate))
        .route(
            &format!("{}/:key", ENDPOINT_PULL_RECORD),
            get(handle_pull_record).put(handle_pull_record),
        )
        .route(ENDPOINT_GOSSIP, put(handle_gossip))
        .route(ENDPOINT_VIEW_CHANGE, put(handle_view_change))
        .route(ENDPOINT_SHARDS, get(handle_list_shards))
        .route(&format!("{}/:id", ENDPOINT_SHARDS), get(handle_shard_info))
        .layer(Extension(node))
}

/// Serves `node` on `listener` with gossip running until `shutdown`
/// resolves. In-flight requests are allowed to finish.
pub async fn serve<F>(
    listener: TcpListener,
    node: Arc<KvsNode>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let gossip = spawn_gossip(node.clone());
    let app = build_router(node.clone());

    tracing::info!(
        "Node {} listening on {}",
        node.address(),
        listener.local_addr()?
    );

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    gossip.abort();
    tracing::info!("Node {} stopped", node.address());
    result
}
