use {
    anchor_spl::token::spl_token,
    reclaim::TokenAccountState,
    solana_sdk::{
        program_pack::Pack,
        pubkey::Pubkey,
    },
};

pub fn fetch_token_account(svm: &litesvm::LiteSVM, address: &Pubkey) -> TokenAccountState {
    let account = svm.get_account(address).unwrap();
    TokenAccountState::from_account(*address, &account).unwrap()
}

pub fn fetch_mint_supply(svm: &litesvm::LiteSVM, mint: &Pubkey) -> u64 {
    let account = svm.get_account(mint).unwrap();
    spl_token::state::Mint::unpack(&account.data).unwrap().supply
}

/// Closed accounts are either purged or left with zero lamports.
pub fn is_closed(svm: &litesvm::LiteSVM, address: &Pubkey) -> bool {
    svm.get_account(address)
        .map_or(true, |account| account.lamports == 0)
}

pub fn balance(svm: &litesvm::LiteSVM, address: &Pubkey) -> u64 {
    svm.get_balance(address).unwrap_or(0)
}
