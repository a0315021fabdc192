//! Agora - membership-gated DAO governance client
//!
//! A client for an on-chain DAO whose membership is a non-fungible token:
//! holders propose treasury NFT purchases, vote YAY or NAY before a
//! deadline, and execute passed proposals once voting closes.
//!
//! Key principles:
//! - The contract is the source of truth; local state is a display cache
//! - Chain id is validated before anything else touches the network
//! - One mutation in flight at a time, owned by the coordinator
//! - Client-side gates are advisory; the contract enforces for real

pub mod contract;
pub mod coordinator;
pub mod eth;
pub mod governance;
pub mod proposals;
pub mod session;
