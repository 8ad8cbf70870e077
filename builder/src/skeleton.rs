//! The mutable transaction under construction.

use bytes::Bytes;
use ckb_cheque_types::{
    Capacity, CapacityResult, CellDep, CellInput, CellMeta, CellOutput, OutPoint, Since,
    Transaction, TransactionBuilder,
};
use std::collections::BTreeMap;

/// The working state every balancing pass reads and appends to.
///
/// Outputs and their data payloads stay positionally paired at all times.
/// Witnesses may lag behind inputs during construction; the capacity
/// balancing pass pads them before the skeleton is handed off. The only
/// non-append mutation is the documented pop/re-append of the change output
/// while folding in the fee.
#[derive(Clone, Debug, Default)]
pub struct TransactionSkeleton {
    inputs: Vec<CellMeta>,
    outputs: Vec<CellOutput>,
    outputs_data: Vec<Bytes>,
    witnesses: Vec<Bytes>,
    inputs_since: BTreeMap<usize, Since>,
    cell_deps: Vec<CellDep>,
}

impl TransactionSkeleton {
    /// An empty skeleton.
    pub fn new() -> Self {
        Self::default()
    }

    /// The consumed cells, in selection order.
    pub fn inputs(&self) -> &[CellMeta] {
        &self.inputs
    }

    /// The produced outputs.
    pub fn outputs(&self) -> &[CellOutput] {
        &self.outputs
    }

    /// Data payloads, positionally paired with outputs.
    pub fn outputs_data(&self) -> &[Bytes] {
        &self.outputs_data
    }

    /// The witness slots filled so far.
    pub fn witnesses(&self) -> &[Bytes] {
        &self.witnesses
    }

    /// The installed dependency references.
    pub fn cell_deps(&self) -> &[CellDep] {
        &self.cell_deps
    }

    /// The since constraint attached to an input, if any.
    pub fn since_of(&self, input_index: usize) -> Option<Since> {
        self.inputs_since.get(&input_index).copied()
    }

    /// Appends a consumed cell.
    pub fn push_input(&mut self, cell: CellMeta) {
        self.inputs.push(cell);
    }

    /// Whether an out-point is already consumed by this skeleton.
    pub fn contains_input(&self, out_point: &OutPoint) -> bool {
        self.inputs.iter().any(|cell| &cell.out_point == out_point)
    }

    /// Appends an output together with its data payload.
    pub fn push_output(&mut self, output: CellOutput, data: Bytes) {
        self.outputs.push(output);
        self.outputs_data.push(data);
    }

    /// Removes and returns the most recently appended output and its data.
    pub fn pop_output(&mut self) -> Option<(CellOutput, Bytes)> {
        let output = self.outputs.pop()?;
        let data = self.outputs_data.pop().expect("outputs and data in lockstep");
        Some((output, data))
    }

    /// Appends a witness slot.
    pub fn push_witness(&mut self, witness: Bytes) {
        self.witnesses.push(witness);
    }

    /// Rewrites an existing witness slot.
    pub fn set_witness(&mut self, index: usize, witness: Bytes) {
        self.witnesses[index] = witness;
    }

    /// Attaches a since constraint to an input.
    pub fn set_since(&mut self, input_index: usize, since: Since) {
        self.inputs_since.insert(input_index, since);
    }

    /// Drops all dependency references; dep lists are rebuilt per call and
    /// never accumulate.
    pub fn clear_cell_deps(&mut self) {
        self.cell_deps.clear();
    }

    /// Installs one dependency reference.
    pub fn push_cell_dep(&mut self, dep: CellDep) {
        self.cell_deps.push(dep);
    }

    /// Total capacity entering through the consumed cells.
    pub fn inputs_capacity(&self) -> CapacityResult<Capacity> {
        self.inputs
            .iter()
            .try_fold(Capacity::zero(), |acc, cell| acc.safe_add(cell.capacity()))
    }

    /// Total capacity leaving through the outputs.
    pub fn outputs_capacity(&self) -> CapacityResult<Capacity> {
        self.outputs
            .iter()
            .try_fold(Capacity::zero(), |acc, output| acc.safe_add(output.capacity))
    }

    /// The wire-format transaction for this shape, as it currently stands.
    pub fn build_transaction(&self) -> Transaction {
        let inputs = self.inputs.iter().enumerate().map(|(index, cell)| {
            let since = self
                .inputs_since
                .get(&index)
                .map(|s| s.as_u64())
                .unwrap_or(0);
            CellInput::new(cell.out_point.clone(), since)
        });
        TransactionBuilder::default()
            .cell_deps(self.cell_deps.iter().cloned())
            .inputs(inputs)
            .outputs(self.outputs.iter().cloned())
            .outputs_data(self.outputs_data.iter().cloned())
            .witnesses(self.witnesses.iter().cloned())
            .build()
    }

    /// Serialized size of the current shape, as counted for fees.
    pub fn serialized_size(&self) -> usize {
        self.build_transaction().serialized_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ckb_cheque_types::{
        h256, CellMetaBuilder, EpochNumberWithFraction, Script, ScriptHashType,
    };

    fn dummy_cell(index: u32, capacity: u64) -> CellMeta {
        let lock = Script::new(h256!("0x1"), ScriptHashType::Type, vec![0u8; 20].into());
        CellMetaBuilder::from_cell_output(
            CellOutput::new(Capacity::shannons(capacity), lock, None),
            Bytes::new(),
        )
        .out_point(OutPoint::new(h256!("0xaa"), index))
        .build()
    }

    #[test]
    fn since_map_is_sparse() {
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_input(dummy_cell(0, 100));
        skeleton.push_input(dummy_cell(1, 100));
        let since = Since::relative_epoch(EpochNumberWithFraction::new(6, 0, 0));
        skeleton.set_since(1, since);

        let tx = skeleton.build_transaction();
        assert_eq!(tx.inputs[0].since, 0);
        assert_eq!(tx.inputs[1].since, since.as_u64());
    }

    #[test]
    fn dedup_is_by_out_point() {
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_input(dummy_cell(0, 100));
        assert!(skeleton.contains_input(&OutPoint::new(h256!("0xaa"), 0)));
        assert!(!skeleton.contains_input(&OutPoint::new(h256!("0xaa"), 1)));
    }

    #[test]
    fn outputs_and_data_stay_paired() {
        let mut skeleton = TransactionSkeleton::new();
        let lock = Script::new(h256!("0x1"), ScriptHashType::Type, vec![0u8; 20].into());
        skeleton.push_output(
            CellOutput::new(Capacity::shannons(1), lock.clone(), None),
            Bytes::from_static(b"a"),
        );
        skeleton.push_output(
            CellOutput::new(Capacity::shannons(2), lock, None),
            Bytes::from_static(b"b"),
        );
        let (output, data) = skeleton.pop_output().unwrap();
        assert_eq!(output.capacity, Capacity::shannons(2));
        assert_eq!(data, Bytes::from_static(b"b"));
        assert_eq!(skeleton.outputs().len(), skeleton.outputs_data().len());
    }

    #[test]
    fn capacity_sums() {
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_input(dummy_cell(0, 100));
        skeleton.push_input(dummy_cell(1, 250));
        assert_eq!(
            skeleton.inputs_capacity().unwrap(),
            Capacity::shannons(350)
        );
        assert_eq!(skeleton.outputs_capacity().unwrap(), Capacity::zero());
    }
}
