//! Shared state of one store node.
//!
//! Request handlers, the gossip loop and the view-change protocol all operate
//! on the same `Arc<KvsNode>`. Each structure inside carries its own
//! synchronization; nothing here is locked globally.

use std::sync::Arc;

use crate::causal::context::{CausalContext, merge_context};
use crate::causal::tracker::CausalTracker;
use crate::config::NodeConfig;
use crate::membership::service::MembershipService;
use crate::membership::types::ClusterView;
use crate::peer::broadcast::Broadcaster;
use crate::peer::client::PeerClient;
use crate::storage::directory::Directory;
use crate::storage::memory::LocalStore;

pub struct KvsNode {
    pub config: NodeConfig,
    pub membership: Arc<MembershipService>,
    pub store: LocalStore,
    pub directory: Directory,
    pub tracker: CausalTracker,
    pub peers: PeerClient,
    pub broadcaster: Broadcaster,
}

impl KvsNode {
    pub fn new(config: NodeConfig) -> Arc<Self> {
        let membership =
            MembershipService::new(config.address.clone(), config.view.clone(), config.repl_factor);
        let peers = PeerClient::new();
        let broadcaster = Broadcaster::new(peers.clone(), config.broadcast_timeout);

        Arc::new(Self {
            config,
            membership,
            store: LocalStore::new(),
            directory: Directory::new(),
            tracker: CausalTracker::new(),
            peers,
            broadcaster,
        })
    }

    pub fn address(&self) -> &str {
        &self.membership.local_address
    }

    /// Merges every local write time into `context` so the client never
    /// leaves knowing less than this node does.
    pub fn merge_local_context(&self, view: &ClusterView, context: &mut CausalContext) {
        let Some(shard) = &view.self_shard else {
            return;
        };
        let local = self.store.timestamps();
        merge_context(context, local.iter().map(|(key, ts)| (key, *ts)), shard);
    }
}
