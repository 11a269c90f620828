use {
    anchor_spl::token::spl_token,
    litesvm::types::TransactionResult,
    solana_sdk::{
        program_pack::Pack,
        pubkey::Pubkey,
        signature::Keypair,
        signer::Signer,
        system_instruction,
        transaction::Transaction,
    },
    spl_token::{
        instruction::initialize_account,
        state::Account,
    },
    std::convert::TryInto,
};

/// Creates a token account for `mint` owned by `owner`, paid for by `owner`.
pub fn create_token_account(
    svm: &mut litesvm::LiteSVM,
    owner: &Keypair,
    mint: &Pubkey,
) -> Keypair {
    let keypair = Keypair::new();
    let rent_exemption = svm.minimum_balance_for_rent_exemption(Account::LEN);

    let create_account_ix = system_instruction::create_account(
        &owner.pubkey(),
        &keypair.pubkey(),
        rent_exemption,
        Account::LEN as u64,
        &spl_token::ID,
    );

    let initialize_account_ix =
        initialize_account(&spl_token::ID, &keypair.pubkey(), mint, &owner.pubkey()).unwrap();

    let transaction = Transaction::new_signed_with_payer(
        &[create_account_ix, initialize_account_ix],
        Some(&owner.pubkey()),
        &[owner, &keypair],
        svm.latest_blockhash(),
    );

    svm.send_transaction(transaction).unwrap();

    keypair
}

/// Creates a mint whose mint authority is the mint keypair itself.
pub fn init_mint_account(svm: &mut litesvm::LiteSVM, payer: &Keypair, mint: &Keypair, decimals: u8) {
    let mint_rent = svm.minimum_balance_for_rent_exemption(spl_token::state::Mint::LEN);
    let mint_tx = Transaction::new_signed_with_payer(
        &[
            system_instruction::create_account(
                &payer.pubkey(),
                &mint.pubkey(),
                mint_rent,
                spl_token::state::Mint::LEN.try_into().unwrap(),
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_mint(
                &spl_token::id(),
                &mint.pubkey(),
                &mint.pubkey(),
                None,
                decimals,
            )
            .unwrap(),
        ],
        Some(&payer.pubkey()),
        &[payer, mint],
        svm.latest_blockhash(),
    );
    svm.send_transaction(mint_tx).unwrap();
}

pub fn airdrop_spl(
    svm: &mut litesvm::LiteSVM,
    payer: &Keypair,
    destination: Pubkey,
    mint: &Keypair,
    amount: u64,
) -> TransactionResult {
    let mint_to_ix = spl_token::instruction::mint_to(
        &spl_token::id(),
        &mint.pubkey(),
        &destination,
        &mint.pubkey(),
        &[],
        amount,
    )
    .unwrap();
    let mint_to_tx = Transaction::new_signed_with_payer(
        &[mint_to_ix],
        Some(&payer.pubkey()),
        &[payer, mint],
        svm.latest_blockhash(),
    );
    svm.send_transaction(mint_to_tx)
}
