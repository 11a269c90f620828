use {
    solana_client::client_error::ClientError,
    solana_sdk::{
        pubkey::Pubkey,
        signature::Signature,
        signer::SignerError,
        transaction::TransactionError,
    },
    thiserror::Error,
};

pub type Result<T> = std::result::Result<T, ReclaimError>;

#[derive(Debug, Error)]
pub enum ReclaimError {
    #[error("No token accounts selected")]
    EmptySelection,
    #[error("{count} token accounts do not fit in one transaction (max {max})")]
    TooManyAccounts { count: usize, max: usize },
    #[error("Transaction of {size} bytes exceeds the {max} byte limit")]
    TransactionTooLarge { size: usize, max: usize },
    #[error("Token account {0} selected twice")]
    DuplicateAccount(Pubkey),
    #[error("Token account {0} not found")]
    AccountNotFound(Pubkey),
    #[error("Account {0} is not an SPL token account")]
    NotTokenAccount(Pubkey),
    #[error("Token account {account} is owned by {actual}, expected {expected}")]
    WrongOwner {
        account:  Pubkey,
        expected: Pubkey,
        actual:   Pubkey,
    },
    #[error("An arithmetic operation unexpectedly overflowed")]
    GenericOverflow,
    #[error("Invalid metadata account: {0}")]
    InvalidMetadata(&'static str),
    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),
    #[error("RPC error: {0}")]
    Rpc(#[from] Box<ClientError>),
    #[error("Transaction {signature} failed: {err}")]
    TransactionFailed {
        signature: Signature,
        err:       TransactionError,
    },
    #[error("Transaction {0} was not confirmed before its blockhash expired")]
    BlockhashExpired(Signature),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Referral store error: {0}")]
    Store(String),
}

impl From<ClientError> for ReclaimError {
    fn from(err: ClientError) -> Self {
        ReclaimError::Rpc(Box::new(err))
    }
}
