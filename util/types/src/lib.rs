//! # The Core Types Library
//!
//! This library provides the essential types for building cheque
//! transactions: cells, scripts, capacities, fee rates, time locks and the
//! canonical molecule wire encoding used to measure transaction size.

pub use bytes;
pub use ckb_fixed_hash::{h256, H256};

mod capacity;
mod cell;
mod fee_rate;
mod script;
mod serialization;
mod since;
mod transaction;
mod witness;

pub use capacity::{Capacity, Error as CapacityError, Result as CapacityResult};
pub use cell::{encode_udt_amount, read_udt_amount, CellMeta, CellMetaBuilder, UDT_AMOUNT_LEN};
pub use fee_rate::FeeRate;
pub use script::{Script, ScriptHashType, UnknownHashTypeError};
pub use since::{EpochNumberWithFraction, Since};
pub use transaction::{
    CellDep, CellInput, CellOutput, DepType, OutPoint, Transaction, TransactionBuilder,
    TX_VERSION,
};
pub use witness::{MalformedWitnessError, WitnessArgs, SIGNATURE_PLACEHOLDER_LEN};
