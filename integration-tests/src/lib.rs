pub mod close;
pub mod setup;
pub mod solana;
