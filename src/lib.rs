//! Assembles unsigned transactions for the cheque cell escrow protocol:
//! a sender deposits a token amount into a cell only the designated
//! receiver can claim, and may withdraw it back after six epochs.
//!
//! This crate is a facade; the actual work lives in the member crates:
//!
//! - [`types`] — cells, scripts, capacities and the canonical wire encoding.
//! - [`builder`] — cell collection, balancing and the three cheque builders.

pub use ckb_cheque_builder as builder;
pub use ckb_cheque_types as types;

pub use ckb_cheque_builder::{
    claim_cheque, create_cheque, withdraw_cheque, CellCollector, CellQuery, ChequeConfig,
    ChequeError, ClaimChequeArgs, CreateChequeArgs, TransactionSkeleton, WithdrawChequeArgs,
};
