use {
    crate::solana::utils::balance,
    litesvm::types::TransactionResult,
    reclaim::{
        build_close_plan,
        constants::DEFAULT_COMPUTE_UNIT_PRICE,
        ClosePlan,
        ClosePlanArgs,
        ReclaimError,
        Referrer,
        Result,
        TokenAccountState,
    },
    solana_sdk::{
        pubkey::Pubkey,
        signature::Keypair,
        signer::Signer,
        transaction::Transaction,
    },
};

/// Builds a close plan from the accounts' current on-chain state, the same
/// way the CLI does against an RPC node.
pub fn plan_close_token_accounts(
    svm: &litesvm::LiteSVM,
    owner: &Pubkey,
    accounts: &[Pubkey],
    beneficiary: Pubkey,
    referrer: Option<Pubkey>,
) -> Result<ClosePlan> {
    let token_accounts = accounts
        .iter()
        .map(|address| {
            let account = svm
                .get_account(address)
                .ok_or(ReclaimError::AccountNotFound(*address))?;
            TokenAccountState::from_account(*address, &account)
        })
        .collect::<Result<Vec<_>>>()?;

    build_close_plan(ClosePlanArgs {
        accounts: &token_accounts,
        owner: *owner,
        beneficiary,
        referrer: referrer.map(|address| Referrer {
            address,
            balance: balance(svm, &address),
        }),
        compute_unit_price: DEFAULT_COMPUTE_UNIT_PRICE,
    })
}

pub fn execute_plan(
    svm: &mut litesvm::LiteSVM,
    owner: &Keypair,
    plan: &ClosePlan,
) -> TransactionResult {
    let transaction = Transaction::new_signed_with_payer(
        &plan.instructions,
        Some(&owner.pubkey()),
        &[owner],
        svm.latest_blockhash(),
    );
    svm.send_transaction(transaction)
}
