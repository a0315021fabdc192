//! Proposal domain model and the in-memory proposal store.
//!
//! The store is a read-through cache for display. The contract is always
//! the source of truth; a refresh rebuilds the whole store rather than
//! merging into it.

use crate::contract::DaoContract;
use crate::eth::EthereumRpc;
use ethers::types::U256;
use futures::future;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// A side in a proposal vote. Wire values match the contract enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Yay = 0,
    Nay = 1,
}

impl Vote {
    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yay => write!(f, "YAY"),
            Self::Nay => write!(f, "NAY"),
        }
    }
}

impl FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("yay") {
            Ok(Self::Yay)
        } else if s.eq_ignore_ascii_case("nay") {
            Ok(Self::Nay)
        } else {
            Err(format!("expected 'yay' or 'nay', got '{s}'"))
        }
    }
}

/// Lifecycle status, derived from `executed` and the deadline at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Deadline in the future, not executed. Voting is open.
    Active,
    /// Deadline passed without execution. Eligible for `executeProposal`.
    ExpiredUnexecuted,
    /// Executed on chain. Terminal.
    Executed,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::ExpiredUnexecuted => write!(f, "expired (unexecuted)"),
            Self::Executed => write!(f, "executed"),
        }
    }
}

/// One proposal as recorded on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: u64,
    /// NFT the treasury would purchase if the proposal passes.
    pub nft_token_id: U256,
    /// Voting deadline. At or past this instant the proposal is no longer
    /// votable and becomes executable.
    pub deadline: SystemTime,
    pub yay_votes: U256,
    pub nay_votes: U256,
    pub executed: bool,
}

impl Proposal {
    /// Derive the lifecycle status as of `now`. Never cached: the same
    /// snapshot answers differently as time passes.
    pub fn status_at(&self, now: SystemTime) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else if now < self.deadline {
            ProposalStatus::Active
        } else {
            ProposalStatus::ExpiredUnexecuted
        }
    }

    /// Status as of the current wall clock.
    pub fn status(&self) -> ProposalStatus {
        self.status_at(SystemTime::now())
    }

    /// Majority side: YAY only on a strict majority, ties go to NAY.
    ///
    /// Display aid only. Execution outcome is decided by the contract, not
    /// by this derivation.
    pub fn winning_side(&self) -> Vote {
        if self.yay_votes > self.nay_votes {
            Vote::Yay
        } else {
            Vote::Nay
        }
    }
}

/// In-memory proposal cache, keyed and iterated by proposal id.
#[derive(Default)]
pub struct ProposalStore {
    proposals: BTreeMap<u64, Proposal>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the store by fetching ids `0..count` from the contract.
    ///
    /// Fetches run concurrently and independently. A failed read is logged
    /// and that proposal omitted; the rest of the list stays available.
    pub async fn refresh_all<P: EthereumRpc>(&mut self, dao: &DaoContract<P>, count: u64) {
        let results = future::join_all((0..count).map(|id| dao.proposal(id))).await;
        let mut fresh = BTreeMap::new();
        for (id, result) in (0..count).zip(results) {
            match result {
                Ok(proposal) => {
                    fresh.insert(id, proposal);
                }
                Err(error) => {
                    tracing::warn!(proposal_id = id, %error, "proposal read failed, omitting");
                }
            }
        }
        self.proposals = fresh;
    }

    pub fn get(&self, proposal_id: u64) -> Option<&Proposal> {
        self.proposals.get(&proposal_id)
    }

    /// Proposals in ascending id order.
    pub fn ordered(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn clear(&mut self) {
        self.proposals.clear();
    }
}
