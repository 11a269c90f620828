use {
    crate::{
        constants::{
            BASE_COMPUTE_UNITS,
            COMPUTE_UNITS_PER_INSTRUCTION,
            MAX_ACCOUNTS_PER_TRANSACTION,
            MAX_COMPUTE_UNITS,
            MAX_TRANSACTION_SIZE,
        },
        error::{
            ReclaimError,
            Result,
        },
        split::{
            Referrer,
            RewardSplit,
        },
        token::TokenAccountState,
    },
    anchor_spl::token::spl_token,
    solana_sdk::{
        compute_budget::ComputeBudgetInstruction,
        instruction::Instruction,
        message::Message,
        pubkey::Pubkey,
        signature::SIGNATURE_BYTES,
        system_instruction,
    },
    std::collections::HashSet,
};

/// Everything needed to close a batch of token accounts in one transaction.
#[derive(Debug, Clone)]
pub struct ClosePlan {
    pub instructions:  Vec<Instruction>,
    pub split:         RewardSplit,
    /// Set only when the referrer receives a transfer.
    pub paid_referrer: Option<Pubkey>,
    pub compute_units: u32,
}

#[derive(Clone, Copy)]
pub struct ClosePlanArgs<'a> {
    pub accounts:           &'a [TokenAccountState],
    pub owner:              Pubkey,
    pub beneficiary:        Pubkey,
    pub referrer:           Option<Referrer>,
    pub compute_unit_price: u64,
}

/// Builds the instructions that burn and close `accounts` and pay the
/// beneficiary and, when eligible, the referrer out of the reclaimed rent.
///
/// Compute budget instructions come first, then a burn (for nonzero
/// balances) followed by a close for every account in selection order, then
/// the transfers. Fails with `TransactionTooLarge` when the signed
/// transaction would not fit in one packet.
pub fn build_close_plan(args: ClosePlanArgs) -> Result<ClosePlan> {
    let ClosePlanArgs {
        accounts,
        owner,
        beneficiary,
        referrer,
        compute_unit_price,
    } = args;

    validate_selection(accounts, &owner)?;

    // Each counterparty receives at most one transfer.
    let paid_referrer = referrer
        .filter(|r| r.address != owner && r.address != beneficiary)
        .filter(Referrer::is_funded)
        .map(|r| r.address);

    let split = RewardSplit::compute(accounts.len(), paid_referrer.is_some())?;

    let mut body = Vec::with_capacity(accounts.len() * 2 + 2);
    for account in accounts {
        if account.amount > 0 {
            body.push(
                spl_token::instruction::burn(
                    &spl_token::ID,
                    &account.address,
                    &account.mint,
                    &owner,
                    &[],
                    account.amount,
                )
                .map_err(|_| ReclaimError::NotTokenAccount(account.address))?,
            );
        }
        body.push(
            spl_token::instruction::close_account(
                &spl_token::ID,
                &account.address,
                &owner,
                &owner,
                &[],
            )
            .map_err(|_| ReclaimError::NotTokenAccount(account.address))?,
        );
    }

    if split.beneficiary_amount > 0 {
        body.push(system_instruction::transfer(
            &owner,
            &beneficiary,
            split.beneficiary_amount,
        ));
    }

    if let Some(referrer) = paid_referrer {
        if split.referrer_amount > 0 {
            body.push(system_instruction::transfer(
                &owner,
                &referrer,
                split.referrer_amount,
            ));
        }
    }

    let compute_units = compute_unit_limit(body.len());
    let mut instructions = Vec::with_capacity(body.len() + 2);
    instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(
        compute_units,
    ));
    instructions.push(ComputeBudgetInstruction::set_compute_unit_price(
        compute_unit_price,
    ));
    instructions.extend(body);

    let size = transaction_size(&instructions, &owner);
    if size > MAX_TRANSACTION_SIZE {
        return Err(ReclaimError::TransactionTooLarge {
            size,
            max: MAX_TRANSACTION_SIZE,
        });
    }

    Ok(ClosePlan {
        instructions,
        split,
        paid_referrer,
        compute_units,
    })
}

pub fn compute_unit_limit(instruction_count: usize) -> u32 {
    let count = u32::try_from(instruction_count).unwrap_or(u32::MAX);
    COMPUTE_UNITS_PER_INSTRUCTION
        .saturating_mul(count)
        .saturating_add(BASE_COMPUTE_UNITS)
        .min(MAX_COMPUTE_UNITS)
}

/// Splits `accounts` into consecutive plans, each as large as fits in one
/// transaction. The referrer is evaluated against the same balance for every
/// plan.
pub fn build_close_plans(args: ClosePlanArgs) -> Result<Vec<ClosePlan>> {
    let accounts = args.accounts;
    if accounts.is_empty() {
        return Err(ReclaimError::EmptySelection);
    }
    check_duplicates(accounts)?;

    let mut plans = vec![];
    let mut start = 0;
    while start < accounts.len() {
        let limit = accounts.len().min(start + MAX_ACCOUNTS_PER_TRANSACTION);
        let mut batch: Option<(usize, ClosePlan)> = None;
        for end in start + 1..=limit {
            match build_close_plan(ClosePlanArgs {
                accounts: &accounts[start..end],
                ..args
            }) {
                Ok(plan) => batch = Some((end, plan)),
                Err(ReclaimError::TransactionTooLarge { .. }) if batch.is_some() => break,
                Err(err) => return Err(err),
            }
        }
        let (end, plan) = batch.ok_or(ReclaimError::EmptySelection)?;
        plans.push(plan);
        start = end;
    }
    Ok(plans)
}

/// Size of the legacy transaction carrying `instructions` once signed.
pub fn transaction_size(instructions: &[Instruction], payer: &Pubkey) -> usize {
    let message = Message::new(instructions, Some(payer));
    let signatures = usize::from(message.header.num_required_signatures);
    // compact-u16 length prefix, one byte below 128 signatures
    1 + signatures * SIGNATURE_BYTES + message.serialize().len()
}

fn validate_selection(accounts: &[TokenAccountState], owner: &Pubkey) -> Result<()> {
    if accounts.is_empty() {
        return Err(ReclaimError::EmptySelection);
    }
    if accounts.len() > MAX_ACCOUNTS_PER_TRANSACTION {
        return Err(ReclaimError::TooManyAccounts {
            count: accounts.len(),
            max:   MAX_ACCOUNTS_PER_TRANSACTION,
        });
    }
    check_duplicates(accounts)?;

    for account in accounts {
        if account.owner != *owner {
            return Err(ReclaimError::WrongOwner {
                account:  account.address,
                expected: *owner,
                actual:   account.owner,
            });
        }
    }
    Ok(())
}

fn check_duplicates(accounts: &[TokenAccountState]) -> Result<()> {
    let mut seen = HashSet::with_capacity(accounts.len());
    for account in accounts {
        if !seen.insert(account.address) {
            return Err(ReclaimError::DuplicateAccount(account.address));
        }
    }
    Ok(())
}
