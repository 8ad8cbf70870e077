//! Balancing passes: token gathering and capacity gathering.
//!
//! `inject_amount` pulls the sender's token cells until the requested amount
//! is covered, returning any surplus in a token change cell. `inject_capacity`
//! closes the capacity gap, reserves the signature slot with a placeholder
//! witness and folds the fee into the capacity change output, so that the
//! finished skeleton satisfies inputs == outputs + fee exactly.

use crate::collector::{CellCollector, CellQuery};
use crate::error::ChequeError;
use crate::skeleton::TransactionSkeleton;
use bytes::Bytes;
use ckb_cheque_types::{
    encode_udt_amount, Capacity, CellOutput, FeeRate, Script, WitnessArgs,
    SIGNATURE_PLACEHOLDER_LEN,
};
use log::{debug, trace};

/// Capacity of a token change or transfer cell: 142 CKB, enough for the
/// cell itself plus a 16-byte amount payload.
pub const UDT_CAPACITY: Capacity = Capacity::shannons(14_200_000_000);

/// Extra capacity (1 CKB) folded into the gathering target so the change
/// output can absorb the fee without another collection round.
pub const CAPACITY_RESERVE: Capacity = Capacity::shannons(100_000_000);

/// Pulls token cells of `sender_lock` until `amount` is covered.
///
/// Consumed cells get an empty witness slot each; a surplus is returned in a
/// fresh token cell locked back to the sender. Cells already present in the
/// skeleton are skipped, so the pass composes with earlier ones over the
/// same collector.
pub fn inject_amount(
    skeleton: &mut TransactionSkeleton,
    provider: &dyn CellCollector,
    sender_lock: &Script,
    udt_script: &Script,
    amount: u128,
) -> Result<(), ChequeError> {
    if amount == 0 {
        return Ok(());
    }
    let query = CellQuery::typed(sender_lock.clone(), udt_script.clone());
    let mut remaining = amount;
    let mut available: u128 = 0;
    for cell in provider.collect(&query) {
        if skeleton.contains_input(&cell.out_point) {
            continue;
        }
        let cell_amount = cell.udt_amount().ok_or(ChequeError::MalformedAmount {
            out_point: cell.out_point.clone(),
        })?;
        trace!("pulling {} tokens from {:?}", cell_amount, cell.out_point);
        skeleton.push_input(cell);
        skeleton.push_witness(Bytes::new());
        available = available
            .checked_add(cell_amount)
            .ok_or(ChequeError::AmountOverflow)?;
        remaining = remaining.saturating_sub(cell_amount);
        if remaining == 0 {
            break;
        }
    }
    if remaining > 0 {
        return Err(ChequeError::InsufficientFunds {
            required: amount,
            available,
        });
    }
    let change = available - amount;
    debug!("gathered {} tokens, {} back as change", available, change);
    if change > 0 {
        skeleton.push_output(
            CellOutput::new(UDT_CAPACITY, sender_lock.clone(), Some(udt_script.clone())),
            encode_udt_amount(change),
        );
    }
    Ok(())
}

/// Pulls plain capacity cells of `sender_lock` until the outputs plus the
/// fee reserve are covered, then settles the fee.
///
/// The change accumulator is primed with [`CAPACITY_RESERVE`] and the
/// gathering target raised by the same amount, which cancels out to an exact
/// inputs == outputs + fee once the fee is deducted from the change. The
/// loop keeps pulling while the change would land below one occupied change
/// cell plus the reserve, so no dust output can be emitted. Termination is
/// only checked after a cell has been appended, so a non-empty stream always
/// contributes at least one sender-locked input for the signature slot,
/// even when the existing inputs already overshoot the target. The fee is
/// measured on the full serialization with the placeholder signature in
/// place; rewriting the change capacity afterwards cannot move the size.
pub fn inject_capacity(
    skeleton: &mut TransactionSkeleton,
    provider: &dyn CellCollector,
    sender_lock: &Script,
    fee_rate: FeeRate,
) -> Result<(), ChequeError> {
    let change_shape = CellOutput::new(Capacity::zero(), sender_lock.clone(), None);
    let minimal_change = change_shape
        .occupied_capacity(Capacity::zero())?
        .safe_add(CAPACITY_RESERVE)?;

    let outputs = skeleton.outputs_capacity()?;
    let inputs = skeleton.inputs_capacity()?;
    let target = outputs.safe_add(CAPACITY_RESERVE)?;
    let (mut need, mut change) = if inputs.as_u64() >= target.as_u64() {
        (
            Capacity::zero(),
            CAPACITY_RESERVE.safe_add(inputs.safe_sub(target)?)?,
        )
    } else {
        (target.safe_sub(inputs)?, CAPACITY_RESERVE)
    };

    let query = CellQuery::capacity_only(sender_lock.clone());
    for cell in provider.collect(&query) {
        if skeleton.contains_input(&cell.out_point) {
            continue;
        }
        let pulled = cell.capacity();
        trace!("pulling {} from {:?}", pulled, cell.out_point);
        skeleton.push_input(cell);
        skeleton.push_witness(Bytes::new());
        if pulled.as_u64() >= need.as_u64() {
            change = change.safe_add(pulled.safe_sub(need)?)?;
            need = Capacity::zero();
        } else {
            need = need.safe_sub(pulled)?;
        }
        if need.is_zero() && (change.is_zero() || change.as_u64() >= minimal_change.as_u64()) {
            break;
        }
    }
    if !need.is_zero() {
        return Err(ChequeError::InsufficientCapacity {
            required: need,
            available: change,
        });
    }
    if !change.is_zero() && change.as_u64() < minimal_change.as_u64() {
        return Err(ChequeError::InsufficientCapacity {
            required: minimal_change,
            available: change,
        });
    }

    let has_change = !change.is_zero();
    if has_change {
        skeleton.push_output(
            CellOutput::new(change, sender_lock.clone(), None),
            Bytes::new(),
        );
    }

    fill_signature_placeholder(skeleton, sender_lock)?;

    let size = skeleton.serialized_size();
    let fee = fee_rate.fee(size);
    debug!("{} bytes serialized, fee {} from change {}", size, fee, change);
    if fee.as_u64() > change.as_u64() {
        return Err(ChequeError::InsufficientCapacity {
            required: fee,
            available: change,
        });
    }
    if has_change {
        skeleton.pop_output();
        let corrected = change.safe_sub(fee)?;
        if !corrected.is_zero() {
            skeleton.push_output(
                CellOutput::new(corrected, sender_lock.clone(), None),
                Bytes::new(),
            );
        }
    }
    Ok(())
}

fn placeholder_lock() -> Bytes {
    Bytes::from(vec![0u8; SIGNATURE_PLACEHOLDER_LEN])
}

/// Reserves the signature slot of the first input locked by `lock`.
///
/// The witness list is padded with empties up to that index, then the slot
/// gets a [`WitnessArgs`] whose lock field is 65 zero bytes, keeping any
/// `input_type`/`output_type` payload already there. A slot that already
/// carries the placeholder is left alone, so the pass may run again over
/// the same skeleton; any other lock content is a conflict.
pub(crate) fn fill_signature_placeholder(
    skeleton: &mut TransactionSkeleton,
    lock: &Script,
) -> Result<(), ChequeError> {
    let index = match skeleton
        .inputs()
        .iter()
        .position(|cell| cell.cell_output.lock == *lock)
    {
        Some(index) => index,
        None => return Ok(()),
    };
    while skeleton.witnesses().len() <= index {
        skeleton.push_witness(Bytes::new());
    }
    let current = &skeleton.witnesses()[index];
    let args = if current.is_empty() {
        WitnessArgs::default()
    } else {
        WitnessArgs::parse(current)
            .map_err(|source| ChequeError::MalformedWitness { index, source })?
    };
    match &args.lock {
        None => {}
        Some(slot) if slot[..] == placeholder_lock()[..] => return Ok(()),
        Some(_) => return Err(ChequeError::WitnessLockConflict { index }),
    }
    let filled = WitnessArgs {
        lock: Some(placeholder_lock()),
        ..args
    };
    skeleton.set_witness(index, filled.serialized());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::InMemoryCellProvider;
    use ckb_cheque_types::{h256, CellMeta, CellMetaBuilder, OutPoint, ScriptHashType};

    fn lock_of(byte: u8) -> Script {
        Script::new(
            h256!("0x9bd7e06f3ecf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce8"),
            ScriptHashType::Type,
            vec![byte; 20].into(),
        )
    }

    fn udt_script() -> Script {
        Script::new(h256!("0x5e7a"), ScriptHashType::Type, vec![9u8; 32].into())
    }

    fn capacity_cell(lock: &Script, shannons: u64, index: u32) -> CellMeta {
        CellMetaBuilder::from_cell_output(
            CellOutput::new(Capacity::shannons(shannons), lock.clone(), None),
            Bytes::new(),
        )
        .out_point(OutPoint::new(h256!("0xca"), index))
        .build()
    }

    fn udt_cell(lock: &Script, amount: u128, index: u32) -> CellMeta {
        CellMetaBuilder::from_cell_output(
            CellOutput::new(UDT_CAPACITY, lock.clone(), Some(udt_script())),
            encode_udt_amount(amount),
        )
        .out_point(OutPoint::new(h256!("0xd0"), index))
        .build()
    }

    #[test]
    fn token_gathering_emits_change() {
        let sender = lock_of(1);
        let provider =
            InMemoryCellProvider::new(vec![udt_cell(&sender, 60, 0), udt_cell(&sender, 50, 1)]);
        let mut skeleton = TransactionSkeleton::new();
        inject_amount(&mut skeleton, &provider, &sender, &udt_script(), 100).unwrap();

        assert_eq!(skeleton.inputs().len(), 2);
        assert_eq!(skeleton.witnesses().len(), 2);
        let (change, data) = (&skeleton.outputs()[0], &skeleton.outputs_data()[0]);
        assert_eq!(change.capacity, UDT_CAPACITY);
        assert_eq!(change.lock, sender);
        assert_eq!(change.type_, Some(udt_script()));
        assert_eq!(ckb_cheque_types::read_udt_amount(data), Some(10));
    }

    #[test]
    fn exact_token_cover_has_no_change() {
        let sender = lock_of(1);
        let provider = InMemoryCellProvider::new(vec![udt_cell(&sender, 100, 0)]);
        let mut skeleton = TransactionSkeleton::new();
        inject_amount(&mut skeleton, &provider, &sender, &udt_script(), 100).unwrap();
        assert!(skeleton.outputs().is_empty());
    }

    #[test]
    fn token_shortfall_reports_both_sides() {
        let sender = lock_of(1);
        let provider = InMemoryCellProvider::new(vec![udt_cell(&sender, 30, 0)]);
        let mut skeleton = TransactionSkeleton::new();
        let err = inject_amount(&mut skeleton, &provider, &sender, &udt_script(), 100)
            .unwrap_err();
        assert_eq!(
            err,
            ChequeError::InsufficientFunds {
                required: 100,
                available: 30,
            }
        );
    }

    #[test]
    fn short_token_data_is_rejected() {
        let sender = lock_of(1);
        let broken = CellMetaBuilder::from_cell_output(
            CellOutput::new(UDT_CAPACITY, sender.clone(), Some(udt_script())),
            Bytes::from_static(&[1, 2, 3]),
        )
        .out_point(OutPoint::new(h256!("0xd0"), 7))
        .build();
        let provider = InMemoryCellProvider::new(vec![broken]);
        let mut skeleton = TransactionSkeleton::new();
        let err = inject_amount(&mut skeleton, &provider, &sender, &udt_script(), 5)
            .unwrap_err();
        assert_eq!(
            err,
            ChequeError::MalformedAmount {
                out_point: OutPoint::new(h256!("0xd0"), 7),
            }
        );
    }

    #[test]
    fn capacity_balance_is_exact_at_zero_fee() {
        let sender = lock_of(1);
        let receiver = lock_of(2);
        let provider =
            InMemoryCellProvider::new(vec![capacity_cell(&sender, 200_0000_0000, 0)]);
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_output(
            CellOutput::new(Capacity::shannons(70_0000_0000), receiver, None),
            Bytes::new(),
        );
        inject_capacity(&mut skeleton, &provider, &sender, FeeRate::zero()).unwrap();

        assert_eq!(
            skeleton.inputs_capacity().unwrap(),
            skeleton.outputs_capacity().unwrap()
        );
        let change = skeleton.outputs().last().unwrap();
        assert_eq!(change.capacity, Capacity::shannons(130_0000_0000));
        assert_eq!(change.lock, sender);
    }

    #[test]
    fn fee_comes_out_of_the_change() {
        let sender = lock_of(1);
        let receiver = lock_of(2);
        let provider =
            InMemoryCellProvider::new(vec![capacity_cell(&sender, 500_0000_0000, 0)]);
        let fee_rate = FeeRate::from_u64(1000);
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_output(
            CellOutput::new(Capacity::shannons(70_0000_0000), receiver, None),
            Bytes::new(),
        );
        inject_capacity(&mut skeleton, &provider, &sender, fee_rate).unwrap();

        let inputs = skeleton.inputs_capacity().unwrap();
        let outputs = skeleton.outputs_capacity().unwrap();
        let fee = inputs.safe_sub(outputs).unwrap();
        assert_eq!(fee, fee_rate.fee(skeleton.serialized_size()));
        assert!(!fee.is_zero());
    }

    #[test]
    fn dust_change_pulls_another_cell() {
        let sender = lock_of(1);
        let receiver = lock_of(2);
        // First cell alone leaves change below one occupied change cell
        // plus the reserve, forcing a second pull.
        let provider = InMemoryCellProvider::new(vec![
            capacity_cell(&sender, 71_0000_0000, 0),
            capacity_cell(&sender, 100_0000_0000, 1),
        ]);
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_output(
            CellOutput::new(Capacity::shannons(70_0000_0000), receiver, None),
            Bytes::new(),
        );
        inject_capacity(&mut skeleton, &provider, &sender, FeeRate::zero()).unwrap();

        assert_eq!(skeleton.inputs().len(), 2);
        let change = skeleton.outputs().last().unwrap();
        assert_eq!(change.capacity, Capacity::shannons(101_0000_0000));
    }

    #[test]
    fn overshooting_inputs_still_pull_a_payer_cell() {
        let sender = lock_of(1);
        let other = lock_of(3);
        // The foreign input alone already covers the target with room to
        // spare; a sender-locked cell must be consumed anyway so the
        // signature slot has an input to land on.
        let provider = InMemoryCellProvider::new(vec![capacity_cell(&sender, 300_0000_0000, 0)]);
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_input(capacity_cell(&other, 200_0000_0000, 9));
        skeleton.push_witness(Bytes::new());
        inject_capacity(&mut skeleton, &provider, &sender, FeeRate::zero()).unwrap();

        assert_eq!(skeleton.inputs().len(), 2);
        assert_eq!(skeleton.inputs()[1].cell_output.lock, sender);
        let args = WitnessArgs::parse(&skeleton.witnesses()[1]).unwrap();
        assert_eq!(args.lock, Some(placeholder_lock()));
        assert_eq!(
            skeleton.inputs_capacity().unwrap(),
            skeleton.outputs_capacity().unwrap()
        );
    }

    #[test]
    fn token_sum_overflow_is_an_error() {
        let sender = lock_of(1);
        let provider = InMemoryCellProvider::new(vec![
            udt_cell(&sender, 1, 0),
            udt_cell(&sender, u128::MAX, 1),
        ]);
        let mut skeleton = TransactionSkeleton::new();
        let err = inject_amount(&mut skeleton, &provider, &sender, &udt_script(), u128::MAX)
            .unwrap_err();
        assert_eq!(err, ChequeError::AmountOverflow);
    }

    #[test]
    fn capacity_shortfall_is_an_error() {
        let sender = lock_of(1);
        let receiver = lock_of(2);
        let provider = InMemoryCellProvider::new(vec![capacity_cell(&sender, 10_0000_0000, 0)]);
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_output(
            CellOutput::new(Capacity::shannons(70_0000_0000), receiver, None),
            Bytes::new(),
        );
        let err =
            inject_capacity(&mut skeleton, &provider, &sender, FeeRate::zero()).unwrap_err();
        assert!(matches!(err, ChequeError::InsufficientCapacity { .. }));
    }

    #[test]
    fn placeholder_lands_on_first_sender_input() {
        let sender = lock_of(1);
        let other = lock_of(3);
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_input(capacity_cell(&other, 100, 0));
        skeleton.push_input(capacity_cell(&sender, 100, 1));
        fill_signature_placeholder(&mut skeleton, &sender).unwrap();

        assert_eq!(skeleton.witnesses().len(), 2);
        assert!(skeleton.witnesses()[0].is_empty());
        let args = WitnessArgs::parse(&skeleton.witnesses()[1]).unwrap();
        assert_eq!(args.lock, Some(placeholder_lock()));
    }

    #[test]
    fn placeholder_pass_is_idempotent() {
        let sender = lock_of(1);
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_input(capacity_cell(&sender, 100, 0));
        fill_signature_placeholder(&mut skeleton, &sender).unwrap();
        let first = skeleton.witnesses()[0].clone();
        fill_signature_placeholder(&mut skeleton, &sender).unwrap();
        assert_eq!(skeleton.witnesses()[0], first);
    }

    #[test]
    fn foreign_signature_in_the_slot_is_a_conflict() {
        let sender = lock_of(1);
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_input(capacity_cell(&sender, 100, 0));
        let signed = WitnessArgs {
            lock: Some(Bytes::from(vec![7u8; SIGNATURE_PLACEHOLDER_LEN])),
            ..Default::default()
        };
        skeleton.push_witness(signed.serialized());
        let err = fill_signature_placeholder(&mut skeleton, &sender).unwrap_err();
        assert_eq!(err, ChequeError::WitnessLockConflict { index: 0 });
    }

    #[test]
    fn unparsable_witness_is_reported_with_its_index() {
        let sender = lock_of(1);
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_input(capacity_cell(&sender, 100, 0));
        skeleton.push_witness(Bytes::from_static(&[1, 2]));
        let err = fill_signature_placeholder(&mut skeleton, &sender).unwrap_err();
        assert!(matches!(err, ChequeError::MalformedWitness { index: 0, .. }));
    }

    #[test]
    fn type_payloads_survive_the_placeholder() {
        let sender = lock_of(1);
        let mut skeleton = TransactionSkeleton::new();
        skeleton.push_input(capacity_cell(&sender, 100, 0));
        let existing = WitnessArgs {
            input_type: Some(Bytes::from_static(&[0xaa])),
            ..Default::default()
        };
        skeleton.push_witness(existing.serialized());
        fill_signature_placeholder(&mut skeleton, &sender).unwrap();

        let args = WitnessArgs::parse(&skeleton.witnesses()[0]).unwrap();
        assert_eq!(args.lock, Some(placeholder_lock()));
        assert_eq!(args.input_type, Some(Bytes::from_static(&[0xaa])));
        assert_eq!(args.output_type, None);
    }
}
