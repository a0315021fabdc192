//! JSON-RPC provider backed by a real Ethereum node.

use super::traits::{EthereumRpc, RpcError, RpcResult, TxOutcome};
use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionRequest, H256, U256, U64};

/// Provider over HTTP JSON-RPC with an optional local signing key.
///
/// Without a key the provider is read-only and
/// [`send_transaction`](EthereumRpc::send_transaction) fails with
/// [`RpcError::NoSigner`].
pub struct RpcProvider {
    provider: Provider<Http>,
    wallet: Option<LocalWallet>,
}

impl RpcProvider {
    /// Connect to `rpc_url`. The wallet, if any, is bound to `chain_id`
    /// so signatures carry replay protection for that chain.
    pub fn new(rpc_url: &str, chain_id: u64, wallet: Option<LocalWallet>) -> RpcResult<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| RpcError::Transport(format!("invalid RPC URL: {e}")))?;
        let wallet = wallet.map(|w| w.with_chain_id(chain_id));
        Ok(Self { provider, wallet })
    }
}

fn transport<E: std::fmt::Display>(e: E) -> RpcError {
    RpcError::Transport(e.to_string())
}

#[async_trait]
impl EthereumRpc for RpcProvider {
    async fn chain_id(&self) -> RpcResult<u64> {
        let chain_id = self.provider.get_chainid().await.map_err(transport)?;
        if chain_id > U256::from(u64::MAX) {
            return Err(RpcError::Transport(format!(
                "chain id {chain_id} out of range"
            )));
        }
        Ok(chain_id.as_u64())
    }

    fn signer_address(&self) -> Option<Address> {
        self.wallet.as_ref().map(|w| w.address())
    }

    async fn get_balance(&self, address: Address) -> RpcResult<U256> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(transport)
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> RpcResult<Vec<u8>> {
        let tx = TransactionRequest::new().to(to).data(data);
        let bytes = self
            .provider
            .call(&tx.into(), None)
            .await
            .map_err(transport)?;
        Ok(bytes.to_vec())
    }

    async fn send_transaction(&self, to: Address, data: Vec<u8>) -> RpcResult<H256> {
        let wallet = self.wallet.clone().ok_or(RpcError::NoSigner)?;
        let from = wallet.address();
        let client = SignerMiddleware::new(self.provider.clone(), wallet);
        let tx = TransactionRequest::new().to(to).data(data).from(from);
        let pending = client
            .send_transaction(tx, None)
            .await
            .map_err(transport)?;
        Ok(pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> RpcResult<TxOutcome> {
        let receipt = PendingTransaction::new(tx_hash, &self.provider)
            .await
            .map_err(transport)?
            .ok_or(RpcError::TxDropped)?;
        let success = receipt.status == Some(U64::one());
        // JSON-RPC receipts carry no revert string; the status bit is all we get.
        Ok(TxOutcome {
            tx_hash,
            success,
            revert_reason: None,
        })
    }
}
