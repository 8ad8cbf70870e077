//! Observed live cells.

use crate::capacity::{Capacity, Result as CapacityResult};
use crate::transaction::{CellOutput, OutPoint};
use bytes::Bytes;
use std::fmt;

/// Width of an encoded fungible-token amount in cell data.
pub const UDT_AMOUNT_LEN: usize = 16;

/// Reads a little-endian token amount from the front of cell data, or
/// `None` when the data is too short to carry one.
pub fn read_udt_amount(data: &[u8]) -> Option<u128> {
    let head: [u8; UDT_AMOUNT_LEN] = data.get(..UDT_AMOUNT_LEN)?.try_into().ok()?;
    Some(u128::from_le_bytes(head))
}

/// Encodes a token amount as 16 little-endian bytes of cell data.
pub fn encode_udt_amount(amount: u128) -> Bytes {
    Bytes::copy_from_slice(&amount.to_le_bytes())
}

/// A live cell as observed from the cell source: the output itself, where
/// it lives, and its data payload.
#[derive(Clone, Eq, PartialEq, Default)]
pub struct CellMeta {
    /// The cell's capacity, lock and type.
    pub cell_output: CellOutput,
    /// Where the cell lives on chain.
    pub out_point: OutPoint,
    /// The cell's data payload.
    pub data: Bytes,
}

impl fmt::Debug for CellMeta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CellMeta")
            .field("cell_output", &self.cell_output)
            .field("out_point", &self.out_point)
            .field("data_bytes", &self.data.len())
            .finish()
    }
}

impl CellMeta {
    /// Declared capacity of the cell.
    pub fn capacity(&self) -> Capacity {
        self.cell_output.capacity
    }

    /// Capacity the cell occupies with its current payload.
    pub fn occupied_capacity(&self) -> CapacityResult<Capacity> {
        self.cell_output
            .occupied_capacity(Capacity::bytes(self.data.len())?)
    }

    /// The token amount carried in the cell data, if any.
    pub fn udt_amount(&self) -> Option<u128> {
        read_udt_amount(&self.data)
    }
}

/// Builder for [`CellMeta`].
#[derive(Default)]
pub struct CellMetaBuilder {
    cell_output: CellOutput,
    out_point: OutPoint,
    data: Bytes,
}

impl CellMetaBuilder {
    /// Starts from an output and its data payload.
    pub fn from_cell_output(cell_output: CellOutput, data: Bytes) -> Self {
        CellMetaBuilder {
            cell_output,
            data,
            ..Default::default()
        }
    }

    /// Sets the cell location.
    pub fn out_point(mut self, out_point: OutPoint) -> Self {
        self.out_point = out_point;
        self
    }

    /// Finalizes the cell.
    pub fn build(self) -> CellMeta {
        let Self {
            cell_output,
            out_point,
            data,
        } = self;
        CellMeta {
            cell_output,
            out_point,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udt_amount_is_little_endian() {
        assert_eq!(read_udt_amount(&encode_udt_amount(0x64)), Some(0x64));
        let mut data = vec![0u8; UDT_AMOUNT_LEN];
        data[0] = 0x01;
        data[1] = 0x02;
        assert_eq!(read_udt_amount(&data), Some(0x0201));
    }

    #[test]
    fn short_data_has_no_amount() {
        assert_eq!(read_udt_amount(&[0u8; 15]), None);
        assert_eq!(read_udt_amount(&[]), None);
    }

    #[test]
    fn trailing_data_is_ignored() {
        let mut data = encode_udt_amount(7).to_vec();
        data.extend_from_slice(b"extra");
        assert_eq!(read_udt_amount(&data), Some(7));
    }
}
