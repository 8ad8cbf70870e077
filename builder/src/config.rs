//! The script registry.
//!
//! Maps the script kinds the protocol recognizes to their on-chain
//! identities (`code_hash` + `hash_type`) and to the cells carrying their
//! code. Supplied externally — typically deserialized from TOML — and
//! passed explicitly into every builder call; there is no ambient global.

use crate::error::ChequeError;
use ckb_cheque_types::{CellDep, DepType, OutPoint, Script, ScriptHashType, H256};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// The script kinds the cheque protocol depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    /// The canonical signature lock; the only lock the protocol accepts for
    /// sender and receiver identities.
    Secp256k1Blake160,
    /// The fungible-token type script.
    Udt,
    /// The cheque lock script itself.
    Cheque,
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ScriptKind::Secp256k1Blake160 => "secp256k1_blake160",
            ScriptKind::Udt => "udt",
            ScriptKind::Cheque => "cheque",
        };
        write!(f, "{name}")
    }
}

/// One known script: how to recognize instances of it, and where its code
/// lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Code hash of script instances.
    pub code_hash: H256,
    /// Hash type of script instances.
    pub hash_type: ScriptHashType,
    /// Transaction carrying the script code cell.
    pub tx_hash: H256,
    /// Output index of the code cell.
    pub index: u32,
    /// Whether the code cell is the code itself or a dep group.
    pub dep_type: DepType,
}

impl ScriptConfig {
    /// The dependency reference transactions running this script must carry.
    pub fn cell_dep(&self) -> CellDep {
        CellDep {
            out_point: OutPoint::new(self.tx_hash.clone(), self.index),
            dep_type: self.dep_type,
        }
    }
}

/// The full registry, one optional entry per kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChequeConfig {
    /// The canonical signature lock.
    pub secp256k1_blake160: Option<ScriptConfig>,
    /// The fungible-token type script.
    pub udt: Option<ScriptConfig>,
    /// The cheque lock.
    pub cheque: Option<ScriptConfig>,
}

impl ChequeConfig {
    /// The registry entry for a kind, if configured.
    pub fn script_config(&self, kind: ScriptKind) -> Option<&ScriptConfig> {
        match kind {
            ScriptKind::Secp256k1Blake160 => self.secp256k1_blake160.as_ref(),
            ScriptKind::Udt => self.udt.as_ref(),
            ScriptKind::Cheque => self.cheque.as_ref(),
        }
    }

    /// Classifies a script by its `code_hash` and `hash_type`; `args` are
    /// instance-specific and do not participate.
    pub fn kind_of(&self, script: &Script) -> Option<ScriptKind> {
        const KINDS: [ScriptKind; 3] = [
            ScriptKind::Secp256k1Blake160,
            ScriptKind::Udt,
            ScriptKind::Cheque,
        ];
        KINDS.into_iter().find(|kind| {
            self.script_config(*kind).is_some_and(|config| {
                config.code_hash == script.code_hash && config.hash_type == script.hash_type
            })
        })
    }

    /// The cell dep for a kind, or `MissingDependencyConfig` when the
    /// registry has no entry.
    pub fn cell_dep(&self, kind: ScriptKind) -> Result<CellDep, ChequeError> {
        self.script_config(kind)
            .map(ScriptConfig::cell_dep)
            .ok_or(ChequeError::MissingDependencyConfig { kind })
    }
}
