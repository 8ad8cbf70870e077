//! Lock and type scripts.

use crate::capacity::{Capacity, Result as CapacityResult};
use crate::serialization;
use bytes::Bytes;
use ckb_cheque_hash::blake2b_256;
use ckb_fixed_hash::H256;
use serde_derive::{Deserialize, Serialize};

/// Specifies how the script `code_hash` is used to match the script code.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptHashType {
    /// Matches script code via cell data hash, runs in the v0 VM.
    #[default]
    Data = 0,
    /// Matches script code via cell type script hash.
    Type = 1,
    /// Matches script code via cell data hash, runs in the v1 VM.
    Data1 = 2,
}

impl TryFrom<u8> for ScriptHashType {
    type Error = UnknownHashTypeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ScriptHashType::Data),
            1 => Ok(ScriptHashType::Type),
            2 => Ok(ScriptHashType::Data1),
            _ => Err(UnknownHashTypeError(v)),
        }
    }
}

impl From<ScriptHashType> for u8 {
    fn from(t: ScriptHashType) -> u8 {
        t as u8
    }
}

/// The byte does not name a known hash type.
#[derive(Debug, PartialEq, Eq, Clone, Copy, thiserror::Error)]
#[error("invalid script hash type {0}")]
pub struct UnknownHashTypeError(pub u8);

/// A spending-authorization predicate (lock) or data-semantics predicate
/// (type) attached to a cell.
///
/// Two scripts are equal iff all three fields match byte-for-byte; identity
/// comparisons across addresses go through [`Script::calc_script_hash`].
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct Script {
    /// Hash identifying the script code.
    pub code_hash: H256,
    /// How `code_hash` resolves to code.
    pub hash_type: ScriptHashType,
    /// Script-specific arguments.
    pub args: Bytes,
}

impl Script {
    /// Creates a script.
    pub fn new(code_hash: H256, hash_type: ScriptHashType, args: Bytes) -> Self {
        Script {
            code_hash,
            hash_type,
            args,
        }
    }

    /// The canonical molecule encoding:
    /// `table Script { code_hash: Byte32, hash_type: byte, args: Bytes }`.
    pub(crate) fn serialized(&self) -> Vec<u8> {
        serialization::table(&[
            self.code_hash.as_bytes().to_vec(),
            vec![u8::from(self.hash_type)],
            serialization::bytes(&self.args),
        ])
    }

    /// Number of serialized bytes, the basis of occupied capacity.
    pub fn serialized_size(&self) -> usize {
        self.serialized().len()
    }

    /// The content hash used for address and identity comparisons.
    pub fn calc_script_hash(&self) -> H256 {
        blake2b_256(self.serialized()).into()
    }

    /// Capacity occupied by this script inside a cell: code hash, hash type
    /// byte and args (the molecule framing is not charged for).
    pub fn occupied_capacity(&self) -> CapacityResult<Capacity> {
        Capacity::bytes(32 + 1 + self.args.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ckb_fixed_hash::h256;

    #[test]
    fn equality_is_byte_for_byte() {
        let a = Script::new(h256!("0x1"), ScriptHashType::Type, Bytes::from_static(b"x"));
        let mut b = a.clone();
        assert_eq!(a, b);
        b.hash_type = ScriptHashType::Data;
        assert_ne!(a, b);
    }

    #[test]
    fn script_hash_commits_to_every_field() {
        let base = Script::new(h256!("0x1"), ScriptHashType::Type, Bytes::new());
        let other_args = Script::new(h256!("0x1"), ScriptHashType::Type, Bytes::from_static(&[0]));
        let other_kind = Script::new(h256!("0x1"), ScriptHashType::Data, Bytes::new());
        assert_ne!(base.calc_script_hash(), other_args.calc_script_hash());
        assert_ne!(base.calc_script_hash(), other_kind.calc_script_hash());
    }

    #[test]
    fn default_script_hash_is_the_known_vector() {
        // blake2b-256 of the 53-byte all-zero script serialization.
        let hash = Script::default().calc_script_hash();
        assert_eq!(
            hash,
            h256!("0x77c93b0632b5b6c3ef922c5b7cea208fb0a7c427a13d50e13d3fefad17e0c590")
        );
    }

    #[test]
    fn occupied_capacity_counts_raw_fields_only() {
        let script = Script::new(h256!("0x1"), ScriptHashType::Type, vec![0u8; 20].into());
        assert_eq!(
            script.occupied_capacity().unwrap(),
            Capacity::bytes(53).unwrap()
        );
        // The wire form adds molecule framing: a 16-byte table header plus
        // the 4-byte length prefix of the args fixvec.
        assert_eq!(script.serialized_size(), 53 + 16 + 4);
    }
}
