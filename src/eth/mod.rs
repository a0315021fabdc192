//! Ethereum boundary module.
//!
//! Everything that talks JSON-RPC lives behind the [`EthereumRpc`] trait:
//! [`RpcProvider`] against a real node, [`MockProvider`] for tests. The rest
//! of the crate never touches a transport directly.

pub mod mock;
pub mod rpc;
pub mod traits;

pub use mock::MockProvider;
pub use rpc::RpcProvider;
pub use traits::{EthereumRpc, PendingTx, RpcError, RpcResult, TxOutcome};

/// Chain id of the Görli testnet, the only network this client accepts.
pub const GOERLI_CHAIN_ID: u64 = 5;
