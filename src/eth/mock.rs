//! Mock Ethereum provider for testing.
//!
//! Simulates the DAO and membership-token contracts from the chain side,
//! dispatching on real ABI selectors so client-side encoding and decoding
//! is exercised without a live node.

use super::traits::{EthereumRpc, RpcError, RpcResult, TxOutcome};
use async_trait::async_trait;
use ethers::abi::{decode, encode, ParamType, Token};
use ethers::types::{Address, H256, U256};
use ethers::utils::id;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Mock provider backed by in-memory chain state.
#[derive(Clone)]
pub struct MockProvider {
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    chain_id: u64,
    online: bool,
    signer: Option<Address>,
    dao: Address,
    token: Address,
    owner: Address,
    nft_price: U256,
    voting_window_secs: u64,
    eth_balances: HashMap<Address, U256>,
    token_balances: HashMap<Address, U256>,
    proposals: Vec<MockProposal>,
    voted: HashSet<(u64, Address)>,
    receipts: HashMap<H256, TxOutcome>,
    failing_reads: HashSet<u64>,
    failing_token_reads: bool,
    reject_next_send: Option<String>,
    drop_next_send: bool,
    next_tx: u64,
    call_count: u64,
    send_count: u64,
    chain_id_queries: u64,
}

struct MockProposal {
    nft_token_id: U256,
    deadline: u64,
    yay: U256,
    nay: U256,
    executed: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            chain_id: super::GOERLI_CHAIN_ID,
            online: true,
            signer: None,
            dao: Address::from_low_u64_be(0xDA0),
            token: Address::from_low_u64_be(0xCAFE),
            owner: Address::from_low_u64_be(0xB055),
            nft_price: U256::exp10(17), // 0.1 ETH
            voting_window_secs: 300,
            eth_balances: HashMap::new(),
            token_balances: HashMap::new(),
            proposals: Vec::new(),
            voted: HashSet::new(),
            receipts: HashMap::new(),
            failing_reads: HashSet::new(),
            failing_token_reads: false,
            reject_next_send: None,
            drop_next_send: false,
            next_tx: 1,
            call_count: 0,
            send_count: 0,
            chain_id_queries: 0,
        }
    }
}

impl MockProvider {
    /// Create a mock on the expected chain with no signer and empty state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn dao_address(&self) -> Address {
        self.state.lock().unwrap().dao
    }

    pub fn token_address(&self) -> Address {
        self.state.lock().unwrap().token
    }

    pub fn owner_address(&self) -> Address {
        self.state.lock().unwrap().owner
    }

    /// Report a different chain id (for network-mismatch tests).
    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().unwrap().chain_id = chain_id;
    }

    /// Attach a signing identity.
    pub fn set_signer(&self, address: Address) {
        self.state.lock().unwrap().signer = Some(address);
    }

    /// Replace the recorded contract owner.
    pub fn set_owner(&self, address: Address) {
        self.state.lock().unwrap().owner = address;
    }

    /// Set an account's ether balance in wei.
    pub fn fund(&self, address: Address, wei: U256) {
        self.state.lock().unwrap().eth_balances.insert(address, wei);
    }

    /// Give an address `count` membership tokens.
    pub fn grant_membership(&self, address: Address, count: u64) {
        self.state
            .lock()
            .unwrap()
            .token_balances
            .insert(address, U256::from(count));
    }

    /// Seed a proposal directly into chain state, returning its id.
    pub fn seed_proposal(
        &self,
        nft_token_id: u64,
        deadline: SystemTime,
        yay: u64,
        nay: u64,
        executed: bool,
    ) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.proposals.push(MockProposal {
            nft_token_id: U256::from(nft_token_id),
            deadline: unix_secs(deadline),
            yay: U256::from(yay),
            nay: U256::from(nay),
            executed,
        });
        (state.proposals.len() - 1) as u64
    }

    /// Make reads of one proposal id fail until restored.
    pub fn fail_proposal_read(&self, proposal_id: u64) {
        self.state.lock().unwrap().failing_reads.insert(proposal_id);
    }

    pub fn restore_proposal_read(&self, proposal_id: u64) {
        self.state.lock().unwrap().failing_reads.remove(&proposal_id);
    }

    /// Make membership-token balance reads fail until restored.
    pub fn fail_token_reads(&self) {
        self.state.lock().unwrap().failing_token_reads = true;
    }

    pub fn restore_token_reads(&self) {
        self.state.lock().unwrap().failing_token_reads = false;
    }

    /// Reject the next send at the provider, before any hash is assigned.
    pub fn reject_next_send(&self, reason: &str) {
        self.state.lock().unwrap().reject_next_send = Some(reason.to_string());
    }

    /// Let the next send broadcast but never produce a receipt.
    pub fn drop_next_send(&self) {
        self.state.lock().unwrap().drop_next_send = true;
    }

    /// Simulate losing the connection to the node.
    pub fn go_offline(&self) {
        self.state.lock().unwrap().online = false;
    }

    pub fn go_online(&self) {
        self.state.lock().unwrap().online = true;
    }

    /// Number of `eth_call`/balance reads issued so far.
    pub fn call_count(&self) -> u64 {
        self.state.lock().unwrap().call_count
    }

    /// Number of transactions submitted so far.
    pub fn send_count(&self) -> u64 {
        self.state.lock().unwrap().send_count
    }

    pub fn chain_id_queries(&self) -> u64 {
        self.state.lock().unwrap().chain_id_queries
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EthereumRpc for MockProvider {
    async fn chain_id(&self) -> RpcResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.chain_id_queries += 1;
        if !state.online {
            return Err(RpcError::Disconnected);
        }
        Ok(state.chain_id)
    }

    fn signer_address(&self) -> Option<Address> {
        self.state.lock().unwrap().signer
    }

    async fn get_balance(&self, address: Address) -> RpcResult<U256> {
        let mut state = self.state.lock().unwrap();
        state.call_count += 1;
        if !state.online {
            return Err(RpcError::Disconnected);
        }
        Ok(state
            .eth_balances
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Vec<u8>) -> RpcResult<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state.call_count += 1;
        if !state.online {
            return Err(RpcError::Disconnected);
        }
        let (selector, args) = split_calldata(&data)?;
        state.read_contract(to, selector, args)
    }

    async fn send_transaction(&self, to: Address, data: Vec<u8>) -> RpcResult<H256> {
        let mut state = self.state.lock().unwrap();
        state.send_count += 1;
        if !state.online {
            return Err(RpcError::Disconnected);
        }
        let sender = state.signer.ok_or(RpcError::NoSigner)?;
        if let Some(reason) = state.reject_next_send.take() {
            return Err(RpcError::Transport(reason));
        }
        let (selector, args) = split_calldata(&data)?;
        let hash = H256::from_low_u64_be(state.next_tx);
        state.next_tx += 1;
        let outcome = match state.run_contract(sender, to, selector, args) {
            Ok(()) => TxOutcome {
                tx_hash: hash,
                success: true,
                revert_reason: None,
            },
            Err(reason) => TxOutcome {
                tx_hash: hash,
                success: false,
                revert_reason: Some(reason),
            },
        };
        if state.drop_next_send {
            state.drop_next_send = false;
        } else {
            state.receipts.insert(hash, outcome);
        }
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> RpcResult<TxOutcome> {
        let state = self.state.lock().unwrap();
        if !state.online {
            return Err(RpcError::Disconnected);
        }
        state
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or(RpcError::TxDropped)
    }
}

impl MockState {
    /// Dispatch an `eth_call` against the simulated contracts.
    fn read_contract(&self, to: Address, selector: [u8; 4], args: &[u8]) -> RpcResult<Vec<u8>> {
        if to == self.token {
            if selector == id("balanceOf(address)") {
                if self.failing_token_reads {
                    return Err(RpcError::Transport(
                        "simulated balance read failure".to_string(),
                    ));
                }
                let holder = address_arg(args)?;
                let balance = self.token_balances.get(&holder).copied().unwrap_or_default();
                return Ok(encode(&[Token::Uint(balance)]));
            }
            return Err(RpcError::Transport(format!(
                "unknown token selector 0x{}",
                hex::encode(selector)
            )));
        }
        if to == self.dao {
            if selector == id("owner()") {
                return Ok(encode(&[Token::Address(self.owner)]));
            }
            if selector == id("numProposals()") {
                return Ok(encode(&[Token::Uint(U256::from(self.proposals.len()))]));
            }
            if selector == id("proposals(uint256)") {
                let index = uint_arg(args)?.low_u64();
                if self.failing_reads.contains(&index) {
                    return Err(RpcError::Transport(format!(
                        "simulated read failure for proposal {index}"
                    )));
                }
                let p = self
                    .proposals
                    .get(index as usize)
                    .ok_or_else(|| RpcError::Transport("execution reverted".to_string()))?;
                return Ok(encode(&[
                    Token::Uint(p.nft_token_id),
                    Token::Uint(U256::from(p.deadline)),
                    Token::Uint(p.yay),
                    Token::Uint(p.nay),
                    Token::Bool(p.executed),
                ]));
            }
            return Err(RpcError::Transport(format!(
                "unknown DAO selector 0x{}",
                hex::encode(selector)
            )));
        }
        Err(RpcError::Transport("call to unknown contract".to_string()))
    }

    /// Run a state-changing call, returning the revert reason on failure.
    fn run_contract(
        &mut self,
        sender: Address,
        to: Address,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<(), String> {
        if to != self.dao {
            return Err("no function at this address".to_string());
        }
        if selector == id("createProposal(uint256)") {
            self.require_member(sender)?;
            let token_id = uint_arg(args).map_err(|e| e.to_string())?;
            let deadline = now_secs() + self.voting_window_secs;
            self.proposals.push(MockProposal {
                nft_token_id: token_id,
                deadline,
                yay: U256::zero(),
                nay: U256::zero(),
                executed: false,
            });
            Ok(())
        } else if selector == id("voteOnProposals(uint256,uint8)") {
            self.require_member(sender)?;
            let (index, choice) = two_uint_args(args).map_err(|e| e.to_string())?;
            let index = index.low_u64();
            let proposal = self
                .proposals
                .get(index as usize)
                .ok_or("invalid proposal index")?;
            if now_secs() >= proposal.deadline {
                return Err("DEADLINE_EXCEEDED".to_string());
            }
            if self.voted.contains(&(index, sender)) {
                return Err("ALREADY_VOTED".to_string());
            }
            if choice > U256::one() {
                return Err("invalid vote value".to_string());
            }
            // Vote weight mirrors the contract: one vote per held token.
            let weight = self.token_balances.get(&sender).copied().unwrap_or_default();
            self.voted.insert((index, sender));
            let proposal = &mut self.proposals[index as usize];
            if choice.is_zero() {
                proposal.yay += weight;
            } else {
                proposal.nay += weight;
            }
            Ok(())
        } else if selector == id("executeProposal(uint256)") {
            self.require_member(sender)?;
            let index = uint_arg(args).map_err(|e| e.to_string())?.low_u64();
            let proposal = self
                .proposals
                .get(index as usize)
                .ok_or("invalid proposal index")?;
            if now_secs() < proposal.deadline {
                return Err("DEADLINE_NOT_EXCEEDED".to_string());
            }
            if proposal.executed {
                return Err("PROPOSAL_ALREADY_EXECUTED".to_string());
            }
            if proposal.yay > proposal.nay {
                let balance = self.eth_balances.get(&self.dao).copied().unwrap_or_default();
                if balance < self.nft_price {
                    return Err("NOT_ENOUGH_FUNDS".to_string());
                }
                self.eth_balances.insert(self.dao, balance - self.nft_price);
            }
            self.proposals[index as usize].executed = true;
            Ok(())
        } else if selector == id("withdrawEther()") {
            if sender != self.owner {
                return Err("Ownable: caller is not the owner".to_string());
            }
            let amount = self.eth_balances.get(&self.dao).copied().unwrap_or_default();
            if amount.is_zero() {
                return Err("Nothing to withdraw, contract balance empty".to_string());
            }
            self.eth_balances.insert(self.dao, U256::zero());
            let owner_balance = self
                .eth_balances
                .get(&self.owner)
                .copied()
                .unwrap_or_default();
            self.eth_balances.insert(self.owner, owner_balance + amount);
            Ok(())
        } else {
            Err(format!("unknown DAO selector 0x{}", hex::encode(selector)))
        }
    }

    fn require_member(&self, sender: Address) -> Result<(), String> {
        let balance = self.token_balances.get(&sender).copied().unwrap_or_default();
        if balance.is_zero() {
            return Err("NOT_A_DAO_MEMBER".to_string());
        }
        Ok(())
    }
}

fn split_calldata(data: &[u8]) -> RpcResult<([u8; 4], &[u8])> {
    if data.len() < 4 {
        return Err(RpcError::Transport(
            "calldata shorter than a selector".to_string(),
        ));
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);
    Ok((selector, &data[4..]))
}

fn address_arg(args: &[u8]) -> RpcResult<Address> {
    let tokens = decode(&[ParamType::Address], args)
        .map_err(|e| RpcError::Transport(format!("calldata decode failed: {e}")))?;
    tokens
        .into_iter()
        .next()
        .and_then(Token::into_address)
        .ok_or_else(|| RpcError::Transport("expected address argument".to_string()))
}

fn uint_arg(args: &[u8]) -> RpcResult<U256> {
    let tokens = decode(&[ParamType::Uint(256)], args)
        .map_err(|e| RpcError::Transport(format!("calldata decode failed: {e}")))?;
    tokens
        .into_iter()
        .next()
        .and_then(Token::into_uint)
        .ok_or_else(|| RpcError::Transport("expected uint argument".to_string()))
}

fn two_uint_args(args: &[u8]) -> RpcResult<(U256, U256)> {
    let tokens = decode(&[ParamType::Uint(256), ParamType::Uint(8)], args)
        .map_err(|e| RpcError::Transport(format!("calldata decode failed: {e}")))?;
    let mut iter = tokens.into_iter();
    let first = iter
        .next()
        .and_then(Token::into_uint)
        .ok_or_else(|| RpcError::Transport("expected uint argument".to_string()))?;
    let second = iter
        .next()
        .and_then(Token::into_uint)
        .ok_or_else(|| RpcError::Transport("expected uint argument".to_string()))?;
    Ok((first, second))
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn now_secs() -> u64 {
    unix_secs(SystemTime::now())
}
