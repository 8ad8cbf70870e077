//! The error types for transaction construction.
//!
//! Every error is terminal for the build in progress: the partially mutated
//! skeleton is inconsistent and the caller must restart from an empty one.

use crate::config::ScriptKind;
use ckb_cheque_types::{Capacity, CapacityError, MalformedWitnessError, OutPoint, H256};

/// Errors raised while assembling a cheque transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChequeError {
    /// The sender's token cells do not cover the requested amount.
    #[error("InsufficientFunds: requested {required} tokens, only {available} available")]
    InsufficientFunds {
        /// The requested transfer amount.
        required: u128,
        /// What the exhausted cell stream provided.
        available: u128,
    },

    /// The capacity cells ran out before the outputs and fee were covered,
    /// or only an under-minimum change would remain.
    #[error(
        "InsufficientCapacity: requested {required} shannons, only {available} available"
    )]
    InsufficientCapacity {
        /// Capacity the build still needs.
        required: Capacity,
        /// Capacity the exhausted cell stream provided.
        available: Capacity,
    },

    /// The lock is not the whitelisted canonical signature lock.
    #[error("UnsupportedLock: lock script {script_hash:#x} is not the sighash lock")]
    UnsupportedLock {
        /// Content hash of the offending lock script.
        script_hash: H256,
    },

    /// A witness slot reserved for the signature already carries a
    /// non-placeholder lock.
    #[error("WitnessLockConflict(witnesses[{index}]): lock field is set aside for signature")]
    WitnessLockConflict {
        /// Index of the conflicting witness.
        index: usize,
    },

    /// A witness did not parse as the canonical layout.
    #[error("MalformedWitness(witnesses[{index}]): {source}")]
    MalformedWitness {
        /// Index of the broken witness.
        index: usize,
        /// What the parser rejected.
        #[source]
        source: MalformedWitnessError,
    },

    /// The script registry lacks an entry the protocol depends on.
    #[error("MissingDependencyConfig: no {kind} entry in the script registry")]
    MissingDependencyConfig {
        /// The absent script kind.
        kind: ScriptKind,
    },

    /// Token amounts summed past the u128 range.
    #[error("AmountOverflow: token amounts exceed the representable range")]
    AmountOverflow,

    /// A token cell's data cannot carry an amount.
    #[error("MalformedAmount({out_point:?}): token cell data is shorter than 16 bytes")]
    MalformedAmount {
        /// The offending cell.
        out_point: OutPoint,
    },

    /// Capacity arithmetic left the representable range.
    #[error(transparent)]
    Overflow(#[from] CapacityError),
}
