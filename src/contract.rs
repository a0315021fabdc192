//! Typed clients for the DAO and membership-token contracts.
//!
//! Calls are encoded by hand against the fixed external ABI. Both contracts
//! are deployed and administered elsewhere; this client only reads them and
//! submits transactions to them.

use crate::eth::{EthereumRpc, PendingTx, RpcError};
use crate::proposals::{Proposal, Vote};
use crate::session::{Handle, PreconditionError};
use ethers::abi::{decode, encode, ParamType, Token};
use ethers::types::{Address, U256};
use ethers::utils::id;
use std::time::{Duration, UNIX_EPOCH};

/// Errors from a contract call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("{0}")]
    Precondition(#[from] PreconditionError),

    #[error("rpc: {0}")]
    Rpc(#[from] RpcError),

    #[error("response decode failed: {0}")]
    Decode(String),
}

/// A contract address bound to a session handle.
struct BoundContract<P: EthereumRpc> {
    address: Address,
    handle: Handle<P>,
}

impl<P: EthereumRpc> BoundContract<P> {
    async fn call(&self, data: Vec<u8>) -> Result<Vec<u8>, ContractError> {
        self.handle.ensure_live()?;
        Ok(self.handle.provider().call(self.address, data).await?)
    }

    async fn send(&self, data: Vec<u8>) -> Result<PendingTx<P>, ContractError> {
        self.handle.ensure_live()?;
        if !self.handle.can_sign() {
            return Err(PreconditionError::ReadOnlyHandle.into());
        }
        let provider = self.handle.provider();
        let hash = provider.send_transaction(self.address, data).await?;
        Ok(PendingTx::new(hash, provider))
    }

    async fn eth_balance(&self) -> Result<U256, ContractError> {
        self.handle.ensure_live()?;
        Ok(self.handle.provider().get_balance(self.address).await?)
    }
}

fn call_data(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = id(signature).to_vec();
    data.extend(encode(args));
    data
}

fn decode_returns(kinds: &[ParamType], raw: &[u8]) -> Result<Vec<Token>, ContractError> {
    decode(kinds, raw).map_err(|e| ContractError::Decode(e.to_string()))
}

fn next_uint(tokens: &mut impl Iterator<Item = Token>) -> Result<U256, ContractError> {
    tokens
        .next()
        .and_then(Token::into_uint)
        .ok_or_else(|| ContractError::Decode("expected uint in response".to_string()))
}

fn next_bool(tokens: &mut impl Iterator<Item = Token>) -> Result<bool, ContractError> {
    tokens
        .next()
        .and_then(Token::into_bool)
        .ok_or_else(|| ContractError::Decode("expected bool in response".to_string()))
}

fn uint_return(raw: &[u8]) -> Result<U256, ContractError> {
    next_uint(&mut decode_returns(&[ParamType::Uint(256)], raw)?.into_iter())
}

fn address_return(raw: &[u8]) -> Result<Address, ContractError> {
    decode_returns(&[ParamType::Address], raw)?
        .into_iter()
        .next()
        .and_then(Token::into_address)
        .ok_or_else(|| ContractError::Decode("expected address in response".to_string()))
}

fn to_u64(value: U256, what: &str) -> Result<u64, ContractError> {
    if value > U256::from(u64::MAX) {
        return Err(ContractError::Decode(format!("{what} exceeds u64")));
    }
    Ok(value.as_u64())
}

/// Client for the DAO contract.
pub struct DaoContract<P: EthereumRpc> {
    inner: BoundContract<P>,
}

impl<P: EthereumRpc> DaoContract<P> {
    pub fn new(address: Address, handle: Handle<P>) -> Self {
        Self {
            inner: BoundContract { address, handle },
        }
    }

    pub fn address(&self) -> Address {
        self.inner.address
    }

    /// Recorded owner of the DAO contract.
    pub async fn owner(&self) -> Result<Address, ContractError> {
        let raw = self.inner.call(call_data("owner()", &[])).await?;
        address_return(&raw)
    }

    /// Total number of proposals ever created.
    pub async fn num_proposals(&self) -> Result<u64, ContractError> {
        let raw = self.inner.call(call_data("numProposals()", &[])).await?;
        to_u64(uint_return(&raw)?, "proposal count")
    }

    /// Fetch one proposal by id.
    pub async fn proposal(&self, proposal_id: u64) -> Result<Proposal, ContractError> {
        let raw = self
            .inner
            .call(call_data(
                "proposals(uint256)",
                &[Token::Uint(U256::from(proposal_id))],
            ))
            .await?;
        let kinds = [
            ParamType::Uint(256), // nftTokenId
            ParamType::Uint(256), // deadline, unix seconds
            ParamType::Uint(256), // yayVotes
            ParamType::Uint(256), // nayVotes
            ParamType::Bool,      // executed
        ];
        let mut tokens = decode_returns(&kinds, &raw)?.into_iter();
        let nft_token_id = next_uint(&mut tokens)?;
        let deadline_secs = to_u64(next_uint(&mut tokens)?, "deadline")?;
        let yay_votes = next_uint(&mut tokens)?;
        let nay_votes = next_uint(&mut tokens)?;
        let executed = next_bool(&mut tokens)?;
        Ok(Proposal {
            id: proposal_id,
            nft_token_id,
            deadline: UNIX_EPOCH + Duration::from_secs(deadline_secs),
            yay_votes,
            nay_votes,
            executed,
        })
    }

    /// Ether held by the DAO contract, in wei.
    pub async fn treasury_balance(&self) -> Result<U256, ContractError> {
        self.inner.eth_balance().await
    }

    pub async fn create_proposal(&self, nft_token_id: U256) -> Result<PendingTx<P>, ContractError> {
        self.inner
            .send(call_data(
                "createProposal(uint256)",
                &[Token::Uint(nft_token_id)],
            ))
            .await
    }

    pub async fn vote_on_proposal(
        &self,
        proposal_id: u64,
        vote: Vote,
    ) -> Result<PendingTx<P>, ContractError> {
        self.inner
            .send(call_data(
                "voteOnProposals(uint256,uint8)",
                &[
                    Token::Uint(U256::from(proposal_id)),
                    Token::Uint(U256::from(vote.as_u8())),
                ],
            ))
            .await
    }

    pub async fn execute_proposal(&self, proposal_id: u64) -> Result<PendingTx<P>, ContractError> {
        self.inner
            .send(call_data(
                "executeProposal(uint256)",
                &[Token::Uint(U256::from(proposal_id))],
            ))
            .await
    }

    /// Drain the treasury to the owner. The contract enforces the owner
    /// check; callers gate on it client-side purely for UX.
    pub async fn withdraw_ether(&self) -> Result<PendingTx<P>, ContractError> {
        self.inner.send(call_data("withdrawEther()", &[])).await
    }
}

/// Client for the membership NFT contract. Read-only.
pub struct MembershipToken<P: EthereumRpc> {
    inner: BoundContract<P>,
}

impl<P: EthereumRpc> MembershipToken<P> {
    pub fn new(address: Address, handle: Handle<P>) -> Self {
        Self {
            inner: BoundContract { address, handle },
        }
    }

    pub fn address(&self) -> Address {
        self.inner.address
    }

    /// Number of membership tokens held by `holder`.
    pub async fn balance_of(&self, holder: Address) -> Result<U256, ContractError> {
        let raw = self
            .inner
            .call(call_data("balanceOf(address)", &[Token::Address(holder)]))
            .await?;
        uint_return(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eth::{MockProvider, GOERLI_CHAIN_ID};
    use crate::session::SessionManager;
    use std::time::SystemTime;

    async fn handle(mock: &MockProvider, signing: bool) -> Handle<MockProvider> {
        let mut manager = SessionManager::new(mock.clone(), GOERLI_CHAIN_ID);
        manager.connect().await.unwrap();
        manager.handle(signing).unwrap()
    }

    #[test]
    fn selectors_match_known_values() {
        assert_eq!(id("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(id("owner()"), [0x8d, 0xa5, 0xcb, 0x5b]);
    }

    #[test]
    fn call_data_is_selector_plus_encoded_args() {
        let data = call_data("balanceOf(address)", &[Token::Address(Address::zero())]);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[..4].to_vec(), id("balanceOf(address)").to_vec());
    }

    #[tokio::test]
    async fn owner_and_count_decode() {
        let mock = MockProvider::new();
        mock.seed_proposal(3, SystemTime::now(), 0, 0, false);
        let dao = DaoContract::new(mock.dao_address(), handle(&mock, false).await);

        assert_eq!(dao.owner().await.unwrap(), mock.owner_address());
        assert_eq!(dao.num_proposals().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn proposal_fields_round_through_abi() {
        let mock = MockProvider::new();
        let deadline = UNIX_EPOCH + Duration::from_secs(2_000_000_000);
        mock.seed_proposal(42, deadline, 3, 1, false);
        let dao = DaoContract::new(mock.dao_address(), handle(&mock, false).await);

        let p = dao.proposal(0).await.unwrap();
        assert_eq!(p.id, 0);
        assert_eq!(p.nft_token_id, U256::from(42));
        assert_eq!(p.deadline, deadline);
        assert_eq!(p.yay_votes, U256::from(3));
        assert_eq!(p.nay_votes, U256::from(1));
        assert!(!p.executed);
    }

    #[tokio::test]
    async fn membership_balance_reads_token_contract() {
        let mock = MockProvider::new();
        let holder = Address::from_low_u64_be(0x33);
        mock.grant_membership(holder, 4);
        let token = MembershipToken::new(mock.token_address(), handle(&mock, false).await);

        assert_eq!(token.balance_of(holder).await.unwrap(), U256::from(4));
    }

    #[tokio::test]
    async fn read_only_handle_cannot_send() {
        let mock = MockProvider::new();
        mock.set_signer(Address::from_low_u64_be(0x44));
        let dao = DaoContract::new(mock.dao_address(), handle(&mock, false).await);

        let err = dao.create_proposal(U256::one()).await.unwrap_err();
        assert_eq!(
            err,
            ContractError::Precondition(PreconditionError::ReadOnlyHandle)
        );
        assert_eq!(mock.send_count(), 0);
    }

    #[tokio::test]
    async fn stale_handle_fails_reads() {
        let mock = MockProvider::new();
        let mut manager = SessionManager::new(mock.clone(), GOERLI_CHAIN_ID);
        manager.connect().await.unwrap();
        let dao = DaoContract::new(mock.dao_address(), manager.handle(false).unwrap());
        manager.disconnect();

        let err = dao.num_proposals().await.unwrap_err();
        assert_eq!(
            err,
            ContractError::Precondition(PreconditionError::StaleSession)
        );
    }
}
