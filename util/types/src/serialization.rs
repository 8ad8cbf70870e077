//! Hand-rolled molecule encoding for the fixed transaction schema.
//!
//! Only the handful of layouts the transaction format needs are implemented:
//! `fixvec` (byte strings and vectors of fixed-size structs), `dynvec` and
//! `table` (identical wire layout: a full-size header, one 32-bit offset per
//! item, then the item bodies), and `option` (empty bytes for `None`).

use molecule::{pack_number, Number, NUMBER_SIZE};

/// Encodes a `Bytes`: a fixvec with one byte items.
pub(crate) fn bytes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(NUMBER_SIZE + data.len());
    out.extend_from_slice(&pack_number(data.len() as Number));
    out.extend_from_slice(data);
    out
}

/// Encodes a fixvec of equally sized items.
pub(crate) fn fixvec(items: &[Vec<u8>]) -> Vec<u8> {
    let body_len: usize = items.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(NUMBER_SIZE + body_len);
    out.extend_from_slice(&pack_number(items.len() as Number));
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Encodes a table; fields are laid out behind a full-size plus offsets
/// header.
pub(crate) fn table(fields: &[Vec<u8>]) -> Vec<u8> {
    let header_len = NUMBER_SIZE * (1 + fields.len());
    let body_len: usize = fields.iter().map(Vec::len).sum();
    let full_len = header_len + body_len;
    let mut out = Vec::with_capacity(full_len);
    out.extend_from_slice(&pack_number(full_len as Number));
    let mut offset = header_len;
    for field in fields {
        out.extend_from_slice(&pack_number(offset as Number));
        offset += field.len();
    }
    for field in fields {
        out.extend_from_slice(field);
    }
    out
}

/// Encodes a dynvec of variably sized items. An empty dynvec is a bare
/// full-size header.
pub(crate) fn dynvec(items: &[Vec<u8>]) -> Vec<u8> {
    if items.is_empty() {
        pack_number(NUMBER_SIZE as Number).to_vec()
    } else {
        table(items)
    }
}

/// Encodes an option as the inner encoding, or empty bytes for `None`.
pub(crate) fn option(inner: Option<Vec<u8>>) -> Vec<u8> {
    inner.unwrap_or_default()
}
