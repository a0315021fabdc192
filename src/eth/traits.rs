//! Trait abstraction for Ethereum JSON-RPC operations.
//!
//! Enables mock implementations for unit testing without a live node.

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use std::sync::Arc;

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors from the RPC boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider is disconnected")]
    Disconnected,

    #[error("no signing key attached to this provider")]
    NoSigner,

    #[error("transaction dropped without a receipt")]
    TxDropped,
}

/// Terminal result of a mined transaction.
///
/// `revert_reason` is populated when the provider can surface one
/// (mocks always can, JSON-RPC receipts cannot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: H256,
    pub success: bool,
    pub revert_reason: Option<String>,
}

/// Ethereum JSON-RPC abstraction.
///
/// Implementations: [`RpcProvider`](super::rpc::RpcProvider) against a real
/// node, [`MockProvider`](super::mock::MockProvider) for tests.
#[async_trait]
pub trait EthereumRpc: Send + Sync {
    /// Chain id reported by the node (`eth_chainId`).
    async fn chain_id(&self) -> RpcResult<u64>;

    /// Address of the attached signing key, if any.
    fn signer_address(&self) -> Option<Address>;

    /// Ether balance of an account, in wei.
    async fn get_balance(&self, address: Address) -> RpcResult<U256>;

    /// Execute a read-only contract call (`eth_call`), returning raw ABI bytes.
    async fn call(&self, to: Address, data: Vec<u8>) -> RpcResult<Vec<u8>>;

    /// Sign and broadcast a state-changing transaction, returning its hash.
    ///
    /// Fails with [`RpcError::NoSigner`] when no key is attached.
    async fn send_transaction(&self, to: Address, data: Vec<u8>) -> RpcResult<H256>;

    /// Block until the transaction is mined and return its outcome.
    async fn wait_for_receipt(&self, tx_hash: H256) -> RpcResult<TxOutcome>;
}

/// A broadcast transaction that has not been mined yet.
///
/// Holds the provider it was sent through so confirmation goes back to the
/// same node.
pub struct PendingTx<P: EthereumRpc + ?Sized> {
    hash: H256,
    provider: Arc<P>,
}

impl<P: EthereumRpc + ?Sized> PendingTx<P> {
    pub(crate) fn new(hash: H256, provider: Arc<P>) -> Self {
        Self { hash, provider }
    }

    /// Transaction hash assigned at broadcast time.
    pub fn tx_hash(&self) -> H256 {
        self.hash
    }

    /// Wait for the transaction to be mined.
    pub async fn confirm(self) -> RpcResult<TxOutcome> {
        self.provider.wait_for_receipt(self.hash).await
    }
}

impl<P: EthereumRpc + ?Sized> std::fmt::Debug for PendingTx<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTx").field("hash", &self.hash).finish()
    }
}
