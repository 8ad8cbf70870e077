//! The cell source seam.
//!
//! Builders never talk to a ledger directly; they pull candidate cells from
//! a [`CellCollector`] capability, typically backed by a remote indexer in
//! production and by [`InMemoryCellProvider`] in tests.

use bytes::Bytes;
use ckb_cheque_types::{CellMeta, Script};

/// Constraint on a candidate cell's type script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TypeScriptFilter {
    /// Any type script, or none.
    #[default]
    Any,
    /// Only cells without a type script.
    Absent,
    /// Only cells whose type script equals the given one.
    Exact(Script),
}

/// Constraint on a candidate cell's data payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DataFilter {
    /// Any payload.
    #[default]
    Any,
    /// Only cells whose payload matches byte-for-byte.
    Exact(Bytes),
}

/// Filter describing which live cells a balancing pass may consume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellQuery {
    /// Required lock script, matched byte-for-byte.
    pub lock: Script,
    /// Type script constraint.
    pub type_: TypeScriptFilter,
    /// Data payload constraint.
    pub data: DataFilter,
}

impl CellQuery {
    /// Cells owned by `lock` carrying exactly the given type script.
    pub fn typed(lock: Script, type_script: Script) -> Self {
        CellQuery {
            lock,
            type_: TypeScriptFilter::Exact(type_script),
            data: DataFilter::Any,
        }
    }

    /// Plain capacity cells of `lock`: no type script, empty data.
    pub fn capacity_only(lock: Script) -> Self {
        CellQuery {
            lock,
            type_: TypeScriptFilter::Absent,
            data: DataFilter::Exact(Bytes::new()),
        }
    }

    /// Whether a cell satisfies every constraint of the query.
    pub fn matches(&self, cell: &CellMeta) -> bool {
        if cell.cell_output.lock != self.lock {
            return false;
        }
        let type_ok = match &self.type_ {
            TypeScriptFilter::Any => true,
            TypeScriptFilter::Absent => cell.cell_output.type_.is_none(),
            TypeScriptFilter::Exact(script) => cell.cell_output.type_.as_ref() == Some(script),
        };
        if !type_ok {
            return false;
        }
        match &self.data {
            DataFilter::Any => true,
            DataFilter::Exact(data) => cell.data == *data,
        }
    }
}

/// A source of live cells.
///
/// The sequence is lazy and possibly unbounded; order is source-defined and
/// not guaranteed stable across calls. Consumers stop early once their
/// accumulation target is met and never rewind. The collector itself has no
/// notion of "already consumed": callers skip out-points they have appended
/// to the skeleton.
pub trait CellCollector {
    /// Cells matching the query.
    fn collect<'a>(&'a self, query: &CellQuery) -> Box<dyn Iterator<Item = CellMeta> + 'a>;
}

/// A cell source over a plain vector, yielding in insertion order.
#[derive(Default, Clone, Debug)]
pub struct InMemoryCellProvider {
    cells: Vec<CellMeta>,
}

impl InMemoryCellProvider {
    /// Wraps a set of live cells.
    pub fn new(cells: Vec<CellMeta>) -> Self {
        InMemoryCellProvider { cells }
    }

    /// Adds one live cell.
    pub fn push(&mut self, cell: CellMeta) {
        self.cells.push(cell);
    }
}

impl CellCollector for InMemoryCellProvider {
    fn collect<'a>(&'a self, query: &CellQuery) -> Box<dyn Iterator<Item = CellMeta> + 'a> {
        let query = query.clone();
        Box::new(
            self.cells
                .iter()
                .filter(move |cell| query.matches(cell))
                .cloned(),
        )
    }
}
