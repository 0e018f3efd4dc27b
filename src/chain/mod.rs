//! On-chain side of round resolution.
//!
//! This module handles:
//! - Loading the contract address and ABI artifacts
//! - The `ResolutionChain` seam used by the round driver
//! - JSON-RPC client that signs and broadcasts resolve transactions
//! - Mock chain for testing

pub mod client;
pub mod contract;
pub mod mock;

pub use client::{ChainClient, ResolutionChain};
pub use contract::{load_abi, load_contract_address, ResolveCall};
pub use mock::{MockChain, MockSubmission};
