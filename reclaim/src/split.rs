use {
    crate::{
        constants::{
            BASIS_POINTS,
            BENEFICIARY_BPS,
            BENEFICIARY_WITH_REFERRER_BPS,
            MIN_REFERRER_BALANCE,
            REFERRER_BPS,
            RENT_PER_ACCOUNT,
        },
        error::{
            ReclaimError,
            Result,
        },
    },
    solana_sdk::pubkey::Pubkey,
};

/// A wallet recorded as having invited the owner, with the balance observed
/// when the transaction was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Referrer {
    pub address: Pubkey,
    pub balance: u64,
}

impl Referrer {
    pub fn is_funded(&self) -> bool {
        self.balance >= MIN_REFERRER_BALANCE
    }
}

/// How the flat rent of a batch of closed accounts is distributed. The owner
/// keeps whatever is left after the beneficiary and referrer transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewardSplit {
    pub account_count:      u64,
    pub total_rent:         u64,
    pub beneficiary_amount: u64,
    pub referrer_amount:    u64,
}

impl RewardSplit {
    pub fn compute(account_count: usize, referrer_paid: bool) -> Result<Self> {
        let account_count = account_count as u64;
        let total_rent = RENT_PER_ACCOUNT
            .checked_mul(account_count)
            .ok_or(ReclaimError::GenericOverflow)?;

        let (beneficiary_bps, referrer_bps) = if referrer_paid {
            (BENEFICIARY_WITH_REFERRER_BPS, REFERRER_BPS)
        } else {
            (BENEFICIARY_BPS, 0)
        };

        Ok(Self {
            account_count,
            total_rent,
            beneficiary_amount: share(total_rent, beneficiary_bps)?,
            referrer_amount: share(total_rent, referrer_bps)?,
        })
    }

    pub fn owner_net(&self) -> u64 {
        self.total_rent - self.beneficiary_amount - self.referrer_amount
    }
}

fn share(total: u64, bps: u64) -> Result<u64> {
    let amount = u128::from(total) * u128::from(bps) / u128::from(BASIS_POINTS);
    u64::try_from(amount).map_err(|_| ReclaimError::GenericOverflow)
}
