//! The witness layout: three optional byte strings, one of which (`lock`)
//! is reserved for the input's signature.

use crate::serialization;
use bytes::Bytes;
use molecule::{unpack_number, NUMBER_SIZE};

/// Byte length of a recoverable secp256k1 signature, and therefore of the
/// all-zero placeholder written before fee measurement.
pub const SIGNATURE_PLACEHOLDER_LEN: usize = 65;

/// Decoded witness fields.
///
/// `lock` carries the signature (or its placeholder); `input_type` and
/// `output_type` belong to the type scripts of the paired input and output
/// and must survive a lock overwrite untouched.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct WitnessArgs {
    /// Signature slot.
    pub lock: Option<Bytes>,
    /// Payload for the input's type script.
    pub input_type: Option<Bytes>,
    /// Payload for the output's type script.
    pub output_type: Option<Bytes>,
}

/// The bytes do not parse as the canonical witness layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedWitnessError {
    /// Shorter than a molecule header.
    #[error("witness is {0} bytes, shorter than a molecule header")]
    HeaderTooShort(usize),
    /// The declared total size disagrees with the byte count.
    #[error("witness declares {declared} bytes but carries {actual}")]
    TotalSizeMismatch {
        /// Size field value.
        declared: usize,
        /// Real length of the witness.
        actual: usize,
    },
    /// The table does not have exactly the three witness fields.
    #[error("witness table has {0} fields, expected 3")]
    FieldCountMismatch(usize),
    /// Field offsets are out of range or not monotonic.
    #[error("witness field offsets are inconsistent")]
    BrokenOffsets,
    /// A present field is not a well-formed byte string.
    #[error("witness field {0} is not a valid byte string")]
    BrokenField(usize),
}

const FIELD_COUNT: usize = 3;

impl WitnessArgs {
    /// Whether all three fields are absent.
    pub fn is_empty(&self) -> bool {
        self.lock.is_none() && self.input_type.is_none() && self.output_type.is_none()
    }

    /// The canonical molecule encoding:
    /// `table WitnessArgs { lock, input_type, output_type: BytesOpt }`.
    pub fn serialized(&self) -> Bytes {
        let field = |f: &Option<Bytes>| {
            serialization::option(f.as_ref().map(|data| serialization::bytes(data)))
        };
        Bytes::from(serialization::table(&[
            field(&self.lock),
            field(&self.input_type),
            field(&self.output_type),
        ]))
    }

    /// Strict decoding of the canonical layout.
    pub fn parse(slice: &[u8]) -> Result<Self, MalformedWitnessError> {
        if slice.len() < NUMBER_SIZE {
            return Err(MalformedWitnessError::HeaderTooShort(slice.len()));
        }
        let total = unpack_number(slice) as usize;
        if total != slice.len() {
            return Err(MalformedWitnessError::TotalSizeMismatch {
                declared: total,
                actual: slice.len(),
            });
        }
        if total == NUMBER_SIZE {
            return Err(MalformedWitnessError::FieldCountMismatch(0));
        }
        if total < NUMBER_SIZE * 2 {
            return Err(MalformedWitnessError::HeaderTooShort(total));
        }
        let first_offset = unpack_number(&slice[NUMBER_SIZE..]) as usize;
        if first_offset % NUMBER_SIZE != 0 || first_offset < NUMBER_SIZE * 2 {
            return Err(MalformedWitnessError::BrokenOffsets);
        }
        let field_count = first_offset / NUMBER_SIZE - 1;
        if field_count != FIELD_COUNT {
            return Err(MalformedWitnessError::FieldCountMismatch(field_count));
        }
        if first_offset > total {
            return Err(MalformedWitnessError::BrokenOffsets);
        }
        let mut offsets = Vec::with_capacity(FIELD_COUNT + 1);
        for i in 0..FIELD_COUNT {
            offsets.push(unpack_number(&slice[NUMBER_SIZE * (1 + i)..]) as usize);
        }
        offsets.push(total);
        if offsets.windows(2).any(|pair| pair[0] > pair[1]) || offsets[0] != first_offset {
            return Err(MalformedWitnessError::BrokenOffsets);
        }
        let mut fields = [None, None, None];
        for (index, field) in fields.iter_mut().enumerate() {
            let raw = &slice[offsets[index]..offsets[index + 1]];
            *field = parse_bytes_opt(raw).ok_or(MalformedWitnessError::BrokenField(index))?;
        }
        let [lock, input_type, output_type] = fields;
        Ok(WitnessArgs {
            lock,
            input_type,
            output_type,
        })
    }
}

// BytesOpt: absent fields serialize to nothing, present ones to a fixvec.
fn parse_bytes_opt(raw: &[u8]) -> Option<Option<Bytes>> {
    if raw.is_empty() {
        return Some(None);
    }
    if raw.len() < NUMBER_SIZE {
        return None;
    }
    let count = unpack_number(raw) as usize;
    if raw.len() != NUMBER_SIZE + count {
        return None;
    }
    Some(Some(Bytes::copy_from_slice(&raw[NUMBER_SIZE..])))
}
