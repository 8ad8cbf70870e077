//! The three cheque operations: create, claim, withdraw.

use crate::balance::{inject_amount, inject_capacity, UDT_CAPACITY};
use crate::collector::{CellCollector, CellQuery};
use crate::config::{ChequeConfig, ScriptKind};
use crate::error::ChequeError;
use crate::skeleton::TransactionSkeleton;
use bytes::Bytes;
use ckb_cheque_types::{
    encode_udt_amount, Capacity, CellOutput, EpochNumberWithFraction, FeeRate, Script, Since,
};
use log::debug;

/// Capacity of a cheque cell: 162 CKB, covering the 40-byte lock args and
/// the token payload with headroom.
pub const CHEQUE_CAPACITY: Capacity = Capacity::shannons(16_200_000_000);

/// Relative epochs a cheque must age before the sender may withdraw it.
pub const CHEQUE_WITHDRAW_EPOCHS: u64 = 6;

/// A request to lock tokens under a cheque the receiver can claim.
#[derive(Clone, Debug)]
pub struct CreateChequeArgs {
    /// The sender's signature lock; pays tokens and capacity.
    pub sender_lock: Script,
    /// The receiver's signature lock; named in the cheque args.
    pub receiver_lock: Script,
    /// The token type script of the escrowed amount.
    pub udt_script: Script,
    /// Token amount to escrow.
    pub amount: u128,
    /// Fee rate for the finished transaction.
    pub fee_rate: FeeRate,
}

/// A request by the receiver to collect every outstanding cheque from one
/// sender.
#[derive(Clone, Debug)]
pub struct ClaimChequeArgs {
    /// The sender's signature lock; gets the capacity deposits back.
    pub sender_lock: Script,
    /// The receiver's signature lock; signs and gets the tokens.
    pub receiver_lock: Script,
    /// The token type script of the escrowed amounts.
    pub udt_script: Script,
    /// Fee rate for the finished transaction.
    pub fee_rate: FeeRate,
}

/// A request by the sender to take back aged, unclaimed cheques.
#[derive(Clone, Debug)]
pub struct WithdrawChequeArgs {
    /// The sender's signature lock; signs and gets the tokens back.
    pub sender_lock: Script,
    /// The receiver's signature lock; names which cheques to target.
    pub receiver_lock: Script,
    /// The token type script of the escrowed amounts.
    pub udt_script: Script,
    /// Fee rate for the finished transaction.
    pub fee_rate: FeeRate,
}

/// The lock script of a cheque between one sender and one receiver.
///
/// Args are the first 20 bytes of the receiver's lock hash followed by the
/// first 20 bytes of the sender's.
pub fn generate_cheque_lock(
    config: &ChequeConfig,
    sender_lock: &Script,
    receiver_lock: &Script,
) -> Result<Script, ChequeError> {
    let cheque = config
        .script_config(ScriptKind::Cheque)
        .ok_or(ChequeError::MissingDependencyConfig {
            kind: ScriptKind::Cheque,
        })?;
    let receiver_hash = receiver_lock.calc_script_hash();
    let sender_hash = sender_lock.calc_script_hash();
    let mut args = Vec::with_capacity(40);
    args.extend_from_slice(&receiver_hash.as_bytes()[..20]);
    args.extend_from_slice(&sender_hash.as_bytes()[..20]);
    Ok(Script::new(
        cheque.code_hash.clone(),
        cheque.hash_type,
        args.into(),
    ))
}

/// Rejects any identity lock other than the canonical signature lock.
fn verify_lock(config: &ChequeConfig, lock: &Script) -> Result<(), ChequeError> {
    if config.kind_of(lock) == Some(ScriptKind::Secp256k1Blake160) {
        Ok(())
    } else {
        Err(ChequeError::UnsupportedLock {
            script_hash: lock.calc_script_hash(),
        })
    }
}

/// Rebuilds the dep list from scratch: the signature lock and token scripts
/// always, the cheque script only when the transaction spends a cheque cell.
fn update_cell_deps(
    skeleton: &mut TransactionSkeleton,
    config: &ChequeConfig,
    is_creating: bool,
) -> Result<(), ChequeError> {
    skeleton.clear_cell_deps();
    skeleton.push_cell_dep(config.cell_dep(ScriptKind::Secp256k1Blake160)?);
    skeleton.push_cell_dep(config.cell_dep(ScriptKind::Udt)?);
    if !is_creating {
        skeleton.push_cell_dep(config.cell_dep(ScriptKind::Cheque)?);
    }
    Ok(())
}

/// Escrows `amount` tokens of the sender under a cheque lock naming the
/// receiver.
pub fn create_cheque(
    provider: &dyn CellCollector,
    config: &ChequeConfig,
    args: &CreateChequeArgs,
) -> Result<TransactionSkeleton, ChequeError> {
    verify_lock(config, &args.sender_lock)?;
    verify_lock(config, &args.receiver_lock)?;

    let mut skeleton = TransactionSkeleton::new();
    update_cell_deps(&mut skeleton, config, true)?;

    let cheque_lock = generate_cheque_lock(config, &args.sender_lock, &args.receiver_lock)?;
    skeleton.push_output(
        CellOutput::new(CHEQUE_CAPACITY, cheque_lock, Some(args.udt_script.clone())),
        encode_udt_amount(args.amount),
    );

    inject_amount(
        &mut skeleton,
        provider,
        &args.sender_lock,
        &args.udt_script,
        args.amount,
    )?;
    inject_capacity(&mut skeleton, provider, &args.sender_lock, args.fee_rate)?;
    Ok(skeleton)
}

/// Claims every live cheque from `sender_lock` to `receiver_lock`.
///
/// All escrowed amounts are consolidated into one token output for the
/// receiver; each consumed cheque's capacity goes back to the sender as a
/// plain cell. When no cheque is live the transaction still carries a
/// zero-amount receiver output.
pub fn claim_cheque(
    provider: &dyn CellCollector,
    config: &ChequeConfig,
    args: &ClaimChequeArgs,
) -> Result<TransactionSkeleton, ChequeError> {
    verify_lock(config, &args.sender_lock)?;
    verify_lock(config, &args.receiver_lock)?;

    let mut skeleton = TransactionSkeleton::new();
    update_cell_deps(&mut skeleton, config, false)?;

    let cheque_lock = generate_cheque_lock(config, &args.sender_lock, &args.receiver_lock)?;
    let query = CellQuery::typed(cheque_lock, args.udt_script.clone());
    let mut claimed: u128 = 0;
    for cell in provider.collect(&query) {
        let amount = cell.udt_amount().ok_or(ChequeError::MalformedAmount {
            out_point: cell.out_point.clone(),
        })?;
        claimed = claimed
            .checked_add(amount)
            .ok_or(ChequeError::AmountOverflow)?;
        skeleton.push_output(
            CellOutput::new(cell.capacity(), args.sender_lock.clone(), None),
            Bytes::new(),
        );
        skeleton.push_input(cell);
        skeleton.push_witness(Bytes::new());
    }
    debug!("claiming {} tokens over {} cheques", claimed, skeleton.inputs().len());

    skeleton.push_output(
        CellOutput::new(
            UDT_CAPACITY,
            args.receiver_lock.clone(),
            Some(args.udt_script.clone()),
        ),
        encode_udt_amount(claimed),
    );

    inject_capacity(&mut skeleton, provider, &args.receiver_lock, args.fee_rate)?;
    Ok(skeleton)
}

/// Takes back every aged cheque from `sender_lock` to `receiver_lock`.
///
/// Each cheque becomes a token cell locked back to the sender, carrying the
/// consumed cell's type script and payload unchanged; every cheque input is
/// constrained to [`CHEQUE_WITHDRAW_EPOCHS`] relative epochs.
pub fn withdraw_cheque(
    provider: &dyn CellCollector,
    config: &ChequeConfig,
    args: &WithdrawChequeArgs,
) -> Result<TransactionSkeleton, ChequeError> {
    verify_lock(config, &args.sender_lock)?;
    verify_lock(config, &args.receiver_lock)?;

    let mut skeleton = TransactionSkeleton::new();
    update_cell_deps(&mut skeleton, config, false)?;

    let cheque_lock = generate_cheque_lock(config, &args.sender_lock, &args.receiver_lock)?;
    let query = CellQuery::typed(cheque_lock, args.udt_script.clone());
    let since = Since::relative_epoch(EpochNumberWithFraction::new(CHEQUE_WITHDRAW_EPOCHS, 0, 0));
    for cell in provider.collect(&query) {
        skeleton.push_output(
            CellOutput::new(
                UDT_CAPACITY,
                args.sender_lock.clone(),
                cell.cell_output.type_.clone(),
            ),
            cell.data.clone(),
        );
        skeleton.push_input(cell);
        skeleton.push_witness(Bytes::new());
        skeleton.set_since(skeleton.inputs().len() - 1, since);
    }
    debug!("withdrawing {} cheques", skeleton.inputs().len());

    inject_capacity(&mut skeleton, provider, &args.sender_lock, args.fee_rate)?;
    Ok(skeleton)
}
