//! Node RPC access.
//!
//! [`RpcClient`] abstracts over the node's JSON-RPC interface so the
//! collector can be driven by the HTTP client in production and by a
//! scripted client in tests. Each method yields an [`RpcResult`]: a failed
//! call is a value the collector inspects, never a panic.

pub mod http;
pub mod types;

pub use http::HttpRpcClient;
pub use types::{
    NodeSnapshot, PeersInfo, RpcError, RpcResult, SyncProgress, SyncState, parse_quantity,
};

/// Read-only view of a node used by the collector.
pub trait RpcClient: Send + Sync {
    /// `web3_clientVersion`
    fn client_version(&self) -> impl Future<Output = RpcResult<String>> + Send;

    /// `eth_syncing`
    fn syncing(&self) -> impl Future<Output = RpcResult<SyncState>> + Send;

    /// `eth_blockNumber`
    fn block_number(&self) -> impl Future<Output = RpcResult<u64>> + Send;

    /// `parity_enode`
    fn peers(&self) -> impl Future<Output = RpcResult<PeersInfo>> + Send;

    /// Issues all four calls concurrently and waits for every one of them.
    ///
    /// A failing call does not cancel the others; its error is kept in the
    /// corresponding snapshot field.
    fn snapshot(&self) -> impl Future<Output = NodeSnapshot> + Send {
        async move {
            let (client_version, sync, block_number, peers) = tokio::join!(
                self.client_version(),
                self.syncing(),
                self.block_number(),
                self.peers(),
            );
            NodeSnapshot {
                client_version,
                sync,
                block_number,
                peers,
            }
        }
    }
}
