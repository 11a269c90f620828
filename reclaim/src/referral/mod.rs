pub mod firestore;

use {
    crate::error::{
        ReclaimError,
        Result,
    },
    solana_sdk::{
        pubkey::Pubkey,
        signature::Signature,
    },
    std::{
        collections::HashMap,
        sync::Mutex,
    },
};

pub use firestore::{
    FirestoreConfig,
    FirestoreReferralStore,
};

/// A referrer payout made by a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardRecord {
    pub wallet_address: Pubkey,
    pub amount:         u64,
    pub tx_signature:   Signature,
}

/// Remote bookkeeping of who invited whom and what referrers were paid.
#[allow(async_fn_in_trait)]
pub trait ReferralStore {
    async fn get_referrer(&self, wallet: &Pubkey) -> Result<Option<Pubkey>>;
    async fn record_reward(&self, record: RewardRecord) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryReferralStore {
    referrers: HashMap<Pubkey, Pubkey>,
    rewards:   Mutex<Vec<RewardRecord>>,
}

impl MemoryReferralStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_referrer(mut self, invitee: Pubkey, referrer: Pubkey) -> Self {
        self.referrers.insert(invitee, referrer);
        self
    }

    pub fn rewards(&self) -> Vec<RewardRecord> {
        self.rewards
            .lock()
            .map(|rewards| rewards.clone())
            .unwrap_or_default()
    }
}

impl ReferralStore for MemoryReferralStore {
    async fn get_referrer(&self, wallet: &Pubkey) -> Result<Option<Pubkey>> {
        Ok(self.referrers.get(wallet).copied())
    }

    async fn record_reward(&self, record: RewardRecord) -> Result<()> {
        self.rewards
            .lock()
            .map_err(|_| ReclaimError::Store("reward log poisoned".to_string()))?
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let invitee = Pubkey::new_unique();
        let referrer = Pubkey::new_unique();
        let store = MemoryReferralStore::new().with_referrer(invitee, referrer);

        assert_eq!(store.get_referrer(&invitee).await.unwrap(), Some(referrer));
        assert_eq!(store.get_referrer(&referrer).await.unwrap(), None);

        let record = RewardRecord {
            wallet_address: referrer,
            amount:         400_000,
            tx_signature:   Signature::default(),
        };
        store.record_reward(record.clone()).await.unwrap();
        assert_eq!(store.rewards(), vec![record]);
    }
}
