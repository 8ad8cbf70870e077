//! Transaction structures and their canonical wire encoding.

use crate::capacity::{Capacity, Result as CapacityResult};
use crate::script::Script;
use crate::serialization;
use bytes::Bytes;
use ckb_cheque_hash::blake2b_256;
use ckb_fixed_hash::H256;
use serde_derive::{Deserialize, Serialize};

/// The transaction version this engine produces.
pub const TX_VERSION: u32 = 0;

/// Reference to an output of a committed transaction.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct OutPoint {
    /// Hash of the transaction carrying the output.
    pub tx_hash: H256,
    /// Position of the output inside that transaction.
    pub index: u32,
}

impl OutPoint {
    /// Creates an out-point.
    pub fn new(tx_hash: H256, index: u32) -> Self {
        OutPoint { tx_hash, index }
    }

    /// The null out-point, used where no cell is referenced.
    pub fn null() -> Self {
        OutPoint {
            tx_hash: H256::default(),
            index: u32::MAX,
        }
    }

    /// Whether self is the null out-point.
    pub fn is_null(&self) -> bool {
        self.tx_hash.as_bytes().iter().all(|x| *x == 0) && self.index == u32::MAX
    }

    // struct OutPoint { tx_hash: Byte32, index: Uint32 }
    pub(crate) fn serialized(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(36);
        out.extend_from_slice(self.tx_hash.as_bytes());
        out.extend_from_slice(&self.index.to_le_bytes());
        out
    }
}

/// A consumed cell reference plus its since constraint.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct CellInput {
    /// The consumed out-point.
    pub previous_output: OutPoint,
    /// Encoded minimum-age constraint; zero means unconstrained.
    pub since: u64,
}

impl CellInput {
    /// Creates an input.
    pub fn new(previous_output: OutPoint, since: u64) -> Self {
        CellInput {
            previous_output,
            since,
        }
    }

    // struct CellInput { since: Uint64, previous_output: OutPoint }
    pub(crate) fn serialized(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(44);
        out.extend_from_slice(&self.since.to_le_bytes());
        out.extend_from_slice(&self.previous_output.serialized());
        out
    }
}

/// An output under construction: capacity, lock and optional type script.
/// The data payload travels separately in `outputs_data`.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct CellOutput {
    /// Capacity carried by the cell.
    pub capacity: Capacity,
    /// The spending-authorization predicate.
    pub lock: Script,
    /// Optional data-semantics predicate.
    pub type_: Option<Script>,
}

impl CellOutput {
    /// Creates an output.
    pub fn new(capacity: Capacity, lock: Script, type_: Option<Script>) -> Self {
        CellOutput {
            capacity,
            lock,
            type_,
        }
    }

    /// Content hash of the lock script.
    pub fn calc_lock_hash(&self) -> H256 {
        self.lock.calc_script_hash()
    }

    /// Capacity this cell occupies on chain when holding `data_capacity`
    /// worth of payload: the capacity field itself, both scripts and the
    /// data.
    pub fn occupied_capacity(&self, data_capacity: Capacity) -> CapacityResult<Capacity> {
        let type_occupied = self
            .type_
            .as_ref()
            .map(Script::occupied_capacity)
            .transpose()?
            .unwrap_or_else(Capacity::zero);
        Capacity::bytes(8)?
            .safe_add(data_capacity)?
            .safe_add(self.lock.occupied_capacity()?)?
            .safe_add(type_occupied)
    }

    /// Whether the declared capacity cannot even pay for the cell's own
    /// storage.
    pub fn is_lack_of_capacity(&self, data_capacity: Capacity) -> CapacityResult<bool> {
        self.occupied_capacity(data_capacity)
            .map(|occupied| self.capacity < occupied)
    }

    // table CellOutput { capacity: Uint64, lock: Script, type_: ScriptOpt }
    pub(crate) fn serialized(&self) -> Vec<u8> {
        serialization::table(&[
            self.capacity.as_u64().to_le_bytes().to_vec(),
            self.lock.serialized(),
            serialization::option(self.type_.as_ref().map(Script::serialized)),
        ])
    }
}

/// How a dependency out-point is interpreted.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepType {
    /// The referenced cell is the script code itself.
    #[default]
    Code = 0,
    /// The referenced cell lists further out-points to expand.
    DepGroup = 1,
}

impl From<DepType> for u8 {
    fn from(t: DepType) -> u8 {
        t as u8
    }
}

/// A cell the transaction depends on for script execution.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct CellDep {
    /// The referenced cell.
    pub out_point: OutPoint,
    /// Code or dep-group expansion.
    pub dep_type: DepType,
}

impl CellDep {
    // struct CellDep { out_point: OutPoint, dep_type: byte }
    pub(crate) fn serialized(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(37);
        out.extend_from_slice(&self.out_point.serialized());
        out.push(u8::from(self.dep_type));
        out
    }
}

/// A fully-shaped (possibly unsigned) transaction.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Transaction {
    /// Format version.
    pub version: u32,
    /// Script-code dependencies.
    pub cell_deps: Vec<CellDep>,
    /// Header dependencies.
    pub header_deps: Vec<H256>,
    /// Consumed cells.
    pub inputs: Vec<CellInput>,
    /// Produced cells.
    pub outputs: Vec<CellOutput>,
    /// Data payloads, positionally paired with `outputs`.
    pub outputs_data: Vec<Bytes>,
    /// Per-input witness slots.
    pub witnesses: Vec<Bytes>,
}

impl Transaction {
    // table RawTransaction { version, cell_deps, header_deps, inputs,
    //                        outputs, outputs_data }
    fn serialized_raw(&self) -> Vec<u8> {
        let cell_deps: Vec<Vec<u8>> = self.cell_deps.iter().map(CellDep::serialized).collect();
        let header_deps: Vec<Vec<u8>> = self
            .header_deps
            .iter()
            .map(|h| h.as_bytes().to_vec())
            .collect();
        let inputs: Vec<Vec<u8>> = self.inputs.iter().map(CellInput::serialized).collect();
        let outputs: Vec<Vec<u8>> = self.outputs.iter().map(CellOutput::serialized).collect();
        let outputs_data: Vec<Vec<u8>> = self
            .outputs_data
            .iter()
            .map(|d| serialization::bytes(d))
            .collect();
        serialization::table(&[
            self.version.to_le_bytes().to_vec(),
            serialization::fixvec(&cell_deps),
            serialization::fixvec(&header_deps),
            serialization::fixvec(&inputs),
            serialization::dynvec(&outputs),
            serialization::dynvec(&outputs_data),
        ])
    }

    /// The canonical wire encoding:
    /// `table Transaction { raw: RawTransaction, witnesses: BytesVec }`.
    pub fn serialized(&self) -> Vec<u8> {
        let witnesses: Vec<Vec<u8>> = self
            .witnesses
            .iter()
            .map(|w| serialization::bytes(w))
            .collect();
        serialization::table(&[self.serialized_raw(), serialization::dynvec(&witnesses)])
    }

    /// Serialized byte length as counted for fees.
    pub fn serialized_size(&self) -> usize {
        // the offset in TransactionVec header is u32
        self.serialized().len() + 4
    }

    /// Hash of the raw transaction, excluding witnesses.
    pub fn calc_tx_hash(&self) -> H256 {
        blake2b_256(self.serialized_raw()).into()
    }

    /// Total declared output capacity.
    pub fn outputs_capacity(&self) -> CapacityResult<Capacity> {
        self.outputs
            .iter()
            .try_fold(Capacity::zero(), |acc, output| {
                acc.safe_add(output.capacity)
            })
    }
}

/// Append-only builder mirroring the construction order of the engine.
#[derive(Debug)]
pub struct TransactionBuilder {
    version: u32,
    cell_deps: Vec<CellDep>,
    header_deps: Vec<H256>,
    inputs: Vec<CellInput>,
    outputs: Vec<CellOutput>,
    outputs_data: Vec<Bytes>,
    witnesses: Vec<Bytes>,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self {
            version: TX_VERSION,
            cell_deps: Default::default(),
            header_deps: Default::default(),
            inputs: Default::default(),
            outputs: Default::default(),
            outputs_data: Default::default(),
            witnesses: Default::default(),
        }
    }
}

impl TransactionBuilder {
    /// Appends a cell dep.
    pub fn cell_dep(mut self, v: CellDep) -> Self {
        self.cell_deps.push(v);
        self
    }

    /// Appends every cell dep of an iterator.
    pub fn cell_deps<T: IntoIterator<Item = CellDep>>(mut self, v: T) -> Self {
        self.cell_deps.extend(v);
        self
    }

    /// Appends a header dep.
    pub fn header_dep(mut self, v: H256) -> Self {
        self.header_deps.push(v);
        self
    }

    /// Appends an input.
    pub fn input(mut self, v: CellInput) -> Self {
        self.inputs.push(v);
        self
    }

    /// Appends every input of an iterator.
    pub fn inputs<T: IntoIterator<Item = CellInput>>(mut self, v: T) -> Self {
        self.inputs.extend(v);
        self
    }

    /// Appends an output.
    pub fn output(mut self, v: CellOutput) -> Self {
        self.outputs.push(v);
        self
    }

    /// Appends every output of an iterator.
    pub fn outputs<T: IntoIterator<Item = CellOutput>>(mut self, v: T) -> Self {
        self.outputs.extend(v);
        self
    }

    /// Appends an output data payload.
    pub fn output_data(mut self, v: Bytes) -> Self {
        self.outputs_data.push(v);
        self
    }

    /// Appends every output data payload of an iterator.
    pub fn outputs_data<T: IntoIterator<Item = Bytes>>(mut self, v: T) -> Self {
        self.outputs_data.extend(v);
        self
    }

    /// Appends a witness.
    pub fn witness(mut self, v: Bytes) -> Self {
        self.witnesses.push(v);
        self
    }

    /// Appends every witness of an iterator.
    pub fn witnesses<T: IntoIterator<Item = Bytes>>(mut self, v: T) -> Self {
        self.witnesses.extend(v);
        self
    }

    /// Finalizes the transaction.
    pub fn build(self) -> Transaction {
        let Self {
            version,
            cell_deps,
            header_deps,
            inputs,
            outputs,
            outputs_data,
            witnesses,
        } = self;
        Transaction {
            version,
            cell_deps,
            header_deps,
            inputs,
            outputs,
            outputs_data,
            witnesses,
        }
    }
}
