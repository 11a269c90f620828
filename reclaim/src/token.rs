use {
    crate::error::{
        ReclaimError,
        Result,
    },
    anchor_lang::AccountDeserialize,
    anchor_spl::token::{
        spl_token,
        TokenAccount,
    },
    solana_sdk::{
        account::Account,
        pubkey::Pubkey,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountState {
    pub address: Pubkey,
    pub mint:    Pubkey,
    pub owner:   Pubkey,
    pub amount:  u64,
}

impl TokenAccountState {
    pub fn from_account(address: Pubkey, account: &Account) -> Result<Self> {
        if account.owner != spl_token::ID {
            return Err(ReclaimError::NotTokenAccount(address));
        }
        Self::from_data(address, &account.data)
    }

    pub fn from_data(address: Pubkey, data: &[u8]) -> Result<Self> {
        let token_account = TokenAccount::try_deserialize(&mut &data[..])
            .map_err(|_| ReclaimError::NotTokenAccount(address))?;
        Ok(Self {
            address,
            mint: token_account.mint,
            owner: token_account.owner,
            amount: token_account.amount,
        })
    }
}

/// Converts a raw token amount to its decimal representation.
pub fn ui_amount(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}
