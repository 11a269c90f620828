use {
    crate::solana::instructions::{
        airdrop_spl,
        create_token_account,
        init_mint_account,
    },
    solana_sdk::{
        native_token::LAMPORTS_PER_SOL,
        pubkey::Pubkey,
        signature::Keypair,
        signer::Signer,
    },
};

pub const OWNER_AIRDROP: u64 = 10 * LAMPORTS_PER_SOL;
pub const BENEFICIARY_AIRDROP: u64 = LAMPORTS_PER_SOL;
pub const MINT_DECIMALS: u8 = 6;

pub struct SetupResult {
    pub svm:            litesvm::LiteSVM,
    pub owner:          Keypair,
    pub beneficiary:    Pubkey,
    pub mint:           Keypair,
    /// One token account per requested balance, in order.
    pub token_accounts: Vec<Pubkey>,
}

pub struct SetupProps {
    /// Raw token balance of every token account to create.
    pub balances: Vec<u64>,
}

pub fn setup(props: SetupProps) -> SetupResult {
    let SetupProps { balances } = props;

    let mut svm = litesvm::LiteSVM::new();
    let owner = Keypair::new();
    let beneficiary = Pubkey::new_unique();
    let mint = Keypair::new();

    svm.airdrop(&owner.pubkey(), OWNER_AIRDROP).unwrap();
    // transfers below the rent-exempt minimum into an empty account are rejected
    svm.airdrop(&beneficiary, BENEFICIARY_AIRDROP).unwrap();

    init_mint_account(&mut svm, &owner, &mint, MINT_DECIMALS);

    let token_accounts = balances
        .iter()
        .map(|&amount| {
            let token_account = create_token_account(&mut svm, &owner, &mint.pubkey());
            if amount > 0 {
                airdrop_spl(&mut svm, &owner, token_account.pubkey(), &mint, amount).unwrap();
            }
            token_account.pubkey()
        })
        .collect();

    SetupResult {
        svm,
        owner,
        beneficiary,
        mint,
        token_accounts,
    }
}
