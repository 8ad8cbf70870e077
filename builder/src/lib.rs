//! # The Cheque Transaction Builders
//!
//! Builds unsigned transactions for the cheque escrow protocol over an
//! abstract cell source:
//!
//! - [`create_cheque`] locks a token amount under a lock derived from the
//!   sender and receiver identities.
//! - [`claim_cheque`] lets the receiver consume the cheque cells, returning
//!   the capacity deposits to the sender.
//! - [`withdraw_cheque`] lets the sender reclaim matured cheque cells,
//!   attaching the six-epoch relative time lock the chain enforces.
//!
//! Every builder starts from an empty [`TransactionSkeleton`], pulls cells
//! through a caller-supplied [`CellCollector`] and balances token amounts
//! and capacity, folding the size-derived fee into the change output. The
//! produced skeleton is unsigned; witness lock slots carry an all-zero
//! placeholder of signature width so the measured size already matches the
//! signed size.

mod balance;
mod cheque;
mod collector;
mod config;
mod error;
mod skeleton;

pub use balance::{inject_amount, inject_capacity, CAPACITY_RESERVE, UDT_CAPACITY};
pub use cheque::{
    claim_cheque, create_cheque, generate_cheque_lock, withdraw_cheque, ClaimChequeArgs,
    CreateChequeArgs, WithdrawChequeArgs, CHEQUE_CAPACITY, CHEQUE_WITHDRAW_EPOCHS,
};
pub use collector::{CellCollector, CellQuery, DataFilter, InMemoryCellProvider, TypeScriptFilter};
pub use config::{ChequeConfig, ScriptConfig, ScriptKind};
pub use error::ChequeError;
pub use skeleton::TransactionSkeleton;
