use {
    anchor_spl::token::spl_token::instruction::TokenInstruction,
    integration_tests::{
        close::{
            execute_plan,
            plan_close_token_accounts,
        },
        setup::{
            setup,
            SetupProps,
            SetupResult,
            BENEFICIARY_AIRDROP,
        },
        solana::{
            instructions::create_token_account,
            utils::{
                balance,
                fetch_mint_supply,
                fetch_token_account,
                is_closed,
            },
        },
    },
    reclaim::ReclaimError,
    solana_sdk::{
        native_token::LAMPORTS_PER_SOL,
        program_pack::Pack,
        pubkey::Pubkey,
        signature::Keypair,
        signer::Signer,
    },
};

// Upper bound on the base fee plus priority fee of one close transaction.
const MAX_FEE: u64 = 100_000;

fn token_account_rent(svm: &litesvm::LiteSVM) -> u64 {
    svm.minimum_balance_for_rent_exemption(anchor_spl::token::spl_token::state::Account::LEN)
}

#[test]
fn test_close_without_referrer() {
    let SetupResult {
        mut svm,
        owner,
        beneficiary,
        mint,
        token_accounts,
    } = setup(SetupProps {
        balances: vec![0, 1_000, 0],
    });
    assert_eq!(fetch_mint_supply(&svm, &mint.pubkey()), 1_000);
    assert_eq!(fetch_token_account(&svm, &token_accounts[1]).amount, 1_000);

    let owner_before = balance(&svm, &owner.pubkey());
    let plan = plan_close_token_accounts(
        &svm,
        &owner.pubkey(),
        &token_accounts,
        beneficiary,
        None,
    )
    .unwrap();
    execute_plan(&mut svm, &owner, &plan).unwrap();

    for token_account in &token_accounts {
        assert!(is_closed(&svm, token_account));
    }
    // the balance was burned, not left behind
    assert_eq!(fetch_mint_supply(&svm, &mint.pubkey()), 0);

    // 15% of 3 * 0.002 SOL
    assert_eq!(plan.split.beneficiary_amount, 900_000);
    assert_eq!(
        balance(&svm, &beneficiary),
        BENEFICIARY_AIRDROP + 900_000
    );

    let expected = owner_before + 3 * token_account_rent(&svm) - 900_000;
    let owner_after = balance(&svm, &owner.pubkey());
    assert!(owner_after <= expected);
    assert!(owner_after + MAX_FEE >= expected);
}

#[test]
fn test_close_with_funded_referrer() {
    let SetupResult {
        mut svm,
        owner,
        beneficiary,
        mint: _,
        token_accounts,
    } = setup(SetupProps {
        balances: vec![5, 0],
    });
    let referrer = Pubkey::new_unique();
    svm.airdrop(&referrer, LAMPORTS_PER_SOL).unwrap();

    let owner_before = balance(&svm, &owner.pubkey());
    let plan = plan_close_token_accounts(
        &svm,
        &owner.pubkey(),
        &token_accounts,
        beneficiary,
        Some(referrer),
    )
    .unwrap();
    assert_eq!(plan.paid_referrer, Some(referrer));
    execute_plan(&mut svm, &owner, &plan).unwrap();

    assert!(token_accounts
        .iter()
        .all(|token_account| is_closed(&svm, token_account)));
    assert_eq!(balance(&svm, &beneficiary), BENEFICIARY_AIRDROP + 200_000);
    assert_eq!(balance(&svm, &referrer), LAMPORTS_PER_SOL + 400_000);

    let expected = owner_before + 2 * token_account_rent(&svm) - 600_000;
    let owner_after = balance(&svm, &owner.pubkey());
    assert!(owner_after <= expected);
    assert!(owner_after + MAX_FEE >= expected);
}

#[test]
fn test_unfunded_referrer_is_not_paid() {
    let SetupResult {
        mut svm,
        owner,
        beneficiary,
        mint: _,
        token_accounts,
    } = setup(SetupProps {
        balances: vec![0, 0],
    });
    let referrer = Pubkey::new_unique();

    let plan = plan_close_token_accounts(
        &svm,
        &owner.pubkey(),
        &token_accounts,
        beneficiary,
        Some(referrer),
    )
    .unwrap();
    assert_eq!(plan.paid_referrer, None);
    execute_plan(&mut svm, &owner, &plan).unwrap();

    // the platform keeps the full 15%
    assert_eq!(balance(&svm, &beneficiary), BENEFICIARY_AIRDROP + 600_000);
    assert_eq!(balance(&svm, &referrer), 0);
}

#[test]
fn test_foreign_account_is_rejected() {
    let SetupResult {
        mut svm,
        owner,
        beneficiary,
        mint,
        token_accounts,
    } = setup(SetupProps { balances: vec![0] });

    let stranger = Keypair::new();
    svm.airdrop(&stranger.pubkey(), LAMPORTS_PER_SOL).unwrap();
    let foreign = create_token_account(&mut svm, &stranger, &mint.pubkey()).pubkey();

    let result = plan_close_token_accounts(
        &svm,
        &owner.pubkey(),
        &[token_accounts[0], foreign],
        beneficiary,
        None,
    );
    assert!(matches!(
        result,
        Err(ReclaimError::WrongOwner { account, actual, .. })
            if account == foreign && actual == stranger.pubkey()
    ));
    assert!(!is_closed(&svm, &foreign));
}

#[test]
fn test_missing_account_is_rejected() {
    let SetupResult {
        svm,
        owner,
        beneficiary,
        ..
    } = setup(SetupProps { balances: vec![] });

    let missing = Pubkey::new_unique();
    assert!(matches!(
        plan_close_token_accounts(&svm, &owner.pubkey(), &[missing], beneficiary, None),
        Err(ReclaimError::AccountNotFound(address)) if address == missing
    ));
}

#[test]
fn test_close_requires_burn() {
    let SetupResult {
        mut svm,
        owner,
        beneficiary,
        mint: _,
        token_accounts,
    } = setup(SetupProps {
        balances: vec![10],
    });

    let mut plan = plan_close_token_accounts(
        &svm,
        &owner.pubkey(),
        &token_accounts,
        beneficiary,
        None,
    )
    .unwrap();
    plan.instructions.retain(|ix| {
        !matches!(
            TokenInstruction::unpack(&ix.data),
            Ok(TokenInstruction::Burn { .. })
        ) || ix.program_id != anchor_spl::token::spl_token::ID
    });

    // the token program refuses to close an account that still holds tokens
    assert!(execute_plan(&mut svm, &owner, &plan).is_err());
    assert!(!is_closed(&svm, &token_accounts[0]));
    assert_eq!(fetch_token_account(&svm, &token_accounts[0]).amount, 10);
}
