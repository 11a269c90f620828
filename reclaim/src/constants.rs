use solana_sdk::{
    native_token::LAMPORTS_PER_SOL,
    packet::PACKET_DATA_SIZE,
    pubkey,
    pubkey::Pubkey,
};

// Rent is charged at a flat rate per closed account rather than the exact
// rent-exempt minimum of a token account (2_039_280 lamports).
pub const RENT_PER_ACCOUNT: u64 = LAMPORTS_PER_SOL / 500; // 0.002 SOL

pub const BASIS_POINTS: u64 = 10_000;
pub const BENEFICIARY_BPS: u64 = 1_500;
pub const BENEFICIARY_WITH_REFERRER_BPS: u64 = 500;
pub const REFERRER_BPS: u64 = 1_000;

// A referrer below this balance is not paid. Transfers to an unfunded system
// account would also fail the rent-exemption check.
pub const MIN_REFERRER_BALANCE: u64 = LAMPORTS_PER_SOL / 1_000; // 0.001 SOL

pub const BASE_COMPUTE_UNITS: u32 = 200_000;
pub const COMPUTE_UNITS_PER_INSTRUCTION: u32 = 20_000;
pub const MAX_COMPUTE_UNITS: u32 = 1_400_000;
pub const DEFAULT_COMPUTE_UNIT_PRICE: u64 = 100_000; // micro-lamports

pub const MAX_ACCOUNTS_PER_TRANSACTION: usize = 20;
// Serialized legacy transaction, signatures included.
pub const MAX_TRANSACTION_SIZE: usize = PACKET_DATA_SIZE;

pub const TOKEN_METADATA_PROGRAM_ID: Pubkey =
    pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");
pub const METADATA_SEED: &[u8] = b"metadata";
