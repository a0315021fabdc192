//! Governance facade.
//!
//! Single entry point for a presentation layer: composes the session
//! manager, contract clients, proposal store, and transaction coordinator
//! into the five user actions and exposes the minimal state needed to
//! render them.
//!
//! The facade is driven from one logical thread. All methods take
//! exclusive access; only the in-flight flag is shared, with the
//! coordinator, through an atomic.

use crate::contract::{ContractError, DaoContract, MembershipToken};
use crate::coordinator::{TransactionCoordinator, TxError};
use crate::eth::{EthereumRpc, TxOutcome};
use crate::proposals::{Proposal, ProposalStore, Vote};
use crate::session::{PreconditionError, SessionError, SessionManager};
use ethers::types::{Address, U256};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A required read failed. State keeps its previous value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("read failed: {0}")]
pub struct ReadError(#[from] pub ContractError);

impl From<PreconditionError> for ReadError {
    fn from(p: PreconditionError) -> Self {
        Self(ContractError::Precondition(p))
    }
}

/// Umbrella error for facade operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GovernanceError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Tx(#[from] TxError),

    #[error(transparent)]
    Read(#[from] ReadError),
}

impl From<ContractError> for GovernanceError {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::Precondition(p) => Self::Precondition(p),
            other => Self::Read(ReadError(other)),
        }
    }
}

pub type GovResult<T> = Result<T, GovernanceError>;

/// Connection lifecycle of the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Snapshot of everything a presentation layer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceState {
    pub connection: ConnectionState,
    /// True when the session carries a signing identity.
    pub wallet_connected: bool,
    /// Advisory only; the contract is the enforcement point for withdraw.
    pub is_owner: bool,
    /// True while a mutation is between submission and confirmation.
    pub loading: bool,
    /// DAO treasury in wei, as of the last refresh.
    pub treasury_balance: U256,
    /// Membership tokens held by the connected identity.
    pub member_token_balance: U256,
    pub proposal_count: u64,
}

impl GovernanceState {
    fn empty() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            wallet_connected: false,
            is_owner: false,
            loading: false,
            treasury_balance: U256::zero(),
            member_token_balance: U256::zero(),
            proposal_count: 0,
        }
    }
}

/// The governance client.
pub struct GovernanceFacade<P: EthereumRpc> {
    session: SessionManager<P>,
    coordinator: TransactionCoordinator,
    loading: Arc<AtomicBool>,
    store: ProposalStore,
    dao_address: Address,
    token_address: Address,
    state: GovernanceState,
}

impl<P: EthereumRpc> GovernanceFacade<P> {
    pub fn new(
        provider: P,
        required_chain_id: u64,
        dao_address: Address,
        token_address: Address,
    ) -> Self {
        let loading = Arc::new(AtomicBool::new(false));
        Self {
            session: SessionManager::new(provider, required_chain_id),
            coordinator: TransactionCoordinator::new(loading.clone()),
            loading,
            store: ProposalStore::new(),
            dao_address,
            token_address,
            state: GovernanceState::empty(),
        }
    }

    /// Current snapshot. Cheap to call; never touches the network.
    pub fn state(&self) -> GovernanceState {
        let mut state = self.state.clone();
        state.loading = self.loading.load(Ordering::SeqCst);
        state
    }

    /// Proposals in id order, as of the last list refresh.
    pub fn proposals(&self) -> Vec<Proposal> {
        self.store.ordered().cloned().collect()
    }

    pub fn proposal(&self, proposal_id: u64) -> Option<Proposal> {
        self.store.get(proposal_id).cloned()
    }

    /// Connected signing identity, if any.
    pub fn identity(&self) -> Option<Address> {
        self.session.session().and_then(|s| s.identity())
    }

    pub fn dao_address(&self) -> Address {
        self.dao_address
    }

    pub fn token_address(&self) -> Address {
        self.token_address
    }

    /// Establish the session and load the initial overview: treasury,
    /// membership balance, proposal count, owner check.
    ///
    /// A chain mismatch or provider failure leaves the facade
    /// disconnected. A failed overview read is logged, the affected field
    /// keeps its previous value, and the first such failure is surfaced,
    /// but the session stays connected.
    pub async fn connect(&mut self) -> GovResult<()> {
        if self.state.connection == ConnectionState::Connected {
            return Ok(());
        }
        self.state.connection = ConnectionState::Connecting;
        let session = match self.session.connect().await {
            Ok(session) => session,
            Err(e) => {
                self.state.connection = ConnectionState::Disconnected;
                return Err(e.into());
            }
        };
        self.state.connection = ConnectionState::Connected;
        self.state.wallet_connected = session.identity().is_some();
        match session.identity() {
            Some(identity) => tracing::info!(
                chain_id = session.chain_id(),
                identity = %identity,
                "session established"
            ),
            None => tracing::info!(
                chain_id = session.chain_id(),
                "read-only session established"
            ),
        }
        self.refresh_overview().await
    }

    /// End the session and discard all derived state.
    pub fn disconnect(&mut self) {
        self.session.disconnect();
        self.store.clear();
        self.state = GovernanceState::empty();
        tracing::info!("session ended");
    }

    /// Re-read the proposal count, then rebuild the proposal list.
    pub async fn refresh_proposals(&mut self) -> GovResult<()> {
        self.ensure_connected()?;
        let dao = self.read_dao()?;
        let count = dao.num_proposals().await?;
        self.state.proposal_count = count;
        self.store.refresh_all(&dao, count).await;
        Ok(())
    }

    /// Create a proposal to purchase `nft_token_id`.
    ///
    /// Requires a membership token; the check runs against the cached
    /// balance and issues no contract call when it fails.
    pub async fn create_proposal(&mut self, nft_token_id: U256) -> GovResult<TxOutcome> {
        self.ensure_connected()?;
        self.ensure_member()?;
        let dao = self.signing_dao()?;
        let coordinator = self.coordinator.clone();
        coordinator
            .submit_and_wait(
                || dao.create_proposal(nft_token_id),
                || self.follow_up_full_refresh(),
            )
            .await
    }

    /// Cast a vote. Same membership gate as
    /// [`create_proposal`](Self::create_proposal).
    pub async fn vote(&mut self, proposal_id: u64, vote: Vote) -> GovResult<TxOutcome> {
        self.ensure_connected()?;
        self.ensure_member()?;
        let dao = self.signing_dao()?;
        let coordinator = self.coordinator.clone();
        coordinator
            .submit_and_wait(
                || dao.vote_on_proposal(proposal_id, vote),
                || self.follow_up_list_refresh(),
            )
            .await
    }

    /// Execute a past-deadline proposal. Eligibility is enforced by the
    /// contract, not gated client-side.
    pub async fn execute(&mut self, proposal_id: u64) -> GovResult<TxOutcome> {
        self.ensure_connected()?;
        let dao = self.signing_dao()?;
        let coordinator = self.coordinator.clone();
        coordinator
            .submit_and_wait(
                || dao.execute_proposal(proposal_id),
                || self.follow_up_execute_refresh(),
            )
            .await
    }

    /// Withdraw the treasury to the owner. Never attempted unless the
    /// connected identity matched the recorded owner at the last refresh.
    pub async fn withdraw(&mut self) -> GovResult<TxOutcome> {
        self.ensure_connected()?;
        self.ensure_owner()?;
        let dao = self.signing_dao()?;
        let coordinator = self.coordinator.clone();
        coordinator
            .submit_and_wait(|| dao.withdraw_ether(), || self.follow_up_treasury_refresh())
            .await
    }

    /// The post-connect read batch. Failures keep previous values; the
    /// first failure is surfaced after every read has been attempted.
    async fn refresh_overview(&mut self) -> GovResult<()> {
        let handle = self.session.handle(false)?;
        let dao = DaoContract::new(self.dao_address, handle.clone());
        let token = MembershipToken::new(self.token_address, handle);
        let identity = self.identity();
        let mut first_failure: Option<ReadError> = None;

        match dao.treasury_balance().await {
            Ok(balance) => self.state.treasury_balance = balance,
            Err(e) => record(&mut first_failure, e, "treasury balance"),
        }
        match identity {
            Some(who) => match token.balance_of(who).await {
                Ok(balance) => self.state.member_token_balance = balance,
                Err(e) => record(&mut first_failure, e, "membership balance"),
            },
            None => self.state.member_token_balance = U256::zero(),
        }
        match dao.num_proposals().await {
            Ok(count) => self.state.proposal_count = count,
            Err(e) => record(&mut first_failure, e, "proposal count"),
        }
        match identity {
            Some(who) => match dao.owner().await {
                Ok(owner) => self.state.is_owner = owner == who,
                Err(e) => record(&mut first_failure, e, "owner check"),
            },
            None => self.state.is_owner = false,
        }

        match first_failure {
            None => Ok(()),
            Some(e) => Err(e.into()),
        }
    }

    async fn follow_up_full_refresh(&mut self) -> Result<(), ReadError> {
        let dao = self.read_dao()?;
        let count = dao.num_proposals().await?;
        self.state.proposal_count = count;
        self.store.refresh_all(&dao, count).await;
        Ok(())
    }

    async fn follow_up_list_refresh(&mut self) -> Result<(), ReadError> {
        let dao = self.read_dao()?;
        self.store.refresh_all(&dao, self.state.proposal_count).await;
        Ok(())
    }

    async fn follow_up_treasury_refresh(&mut self) -> Result<(), ReadError> {
        let dao = self.read_dao()?;
        self.state.treasury_balance = dao.treasury_balance().await?;
        Ok(())
    }

    /// Executions both flip a proposal and spend treasury funds.
    async fn follow_up_execute_refresh(&mut self) -> Result<(), ReadError> {
        self.follow_up_list_refresh().await?;
        self.follow_up_treasury_refresh().await
    }

    fn read_dao(&self) -> Result<DaoContract<P>, PreconditionError> {
        Ok(DaoContract::new(self.dao_address, self.session.handle(false)?))
    }

    fn signing_dao(&self) -> Result<DaoContract<P>, PreconditionError> {
        Ok(DaoContract::new(self.dao_address, self.session.handle(true)?))
    }

    fn ensure_connected(&self) -> Result<(), PreconditionError> {
        if self.state.connection == ConnectionState::Connected {
            Ok(())
        } else {
            Err(PreconditionError::NotConnected)
        }
    }

    fn ensure_member(&self) -> Result<(), PreconditionError> {
        if self.state.member_token_balance.is_zero() {
            Err(PreconditionError::NotAMember)
        } else {
            Ok(())
        }
    }

    fn ensure_owner(&self) -> Result<(), PreconditionError> {
        if self.state.is_owner {
            Ok(())
        } else {
            Err(PreconditionError::NotOwner)
        }
    }
}

fn record(first: &mut Option<ReadError>, error: ContractError, what: &'static str) {
    tracing::warn!(%error, what, "state read failed, keeping previous value");
    if first.is_none() {
        *first = Some(ReadError(error));
    }
}
