//! Referral bookkeeping stored in Cloud Firestore, accessed over its REST API.
//!
//! Collections:
//! - `invitations/{code}`: `inviterWallet`, `inviteCode`, `invitees[]`
//! - `rewardHistory/{auto}`: `walletAddress`, `amount` (SOL), `txSignature`, `timestamp`
//! - `inviteStats/{wallet}`: `walletAddress`, `totalInvites`, `totalRewards` (SOL), `lastRewardAt`
use {
    super::{
        ReferralStore,
        RewardRecord,
    },
    crate::error::{
        ReclaimError,
        Result,
    },
    chrono::{
        DateTime,
        SecondsFormat,
        Utc,
    },
    reqwest::{
        Client,
        RequestBuilder,
        StatusCode,
    },
    serde::Deserialize,
    serde_json::{
        json,
        Value,
    },
    solana_sdk::{
        native_token::lamports_to_sol,
        pubkey::Pubkey,
    },
    std::{
        collections::HashMap,
        str::FromStr,
    },
};

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

const STATS_UPDATE_MASK: &[&str] = &["totalRewards", "lastRewardAt"];
// PATCH without a mask replaces (or creates) the whole document.
const CREATE_MASK: &[&str] = &[];

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub base_url:   String,
    pub project_id: String,
    pub api_key:    Option<String>,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: DEFAULT_FIRESTORE_URL.to_string(),
            project_id: project_id.into(),
            api_key,
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct Document {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

impl Document {
    fn string(&self, name: &str) -> Option<&str> {
        self.fields.get(name)?.get("stringValue")?.as_str()
    }

    // Firestore encodes int64 values as strings.
    fn number(&self, name: &str) -> Option<f64> {
        let value = self.fields.get(name)?;
        value
            .get("doubleValue")
            .and_then(Value::as_f64)
            .or_else(|| value.get("integerValue")?.as_str()?.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
struct RunQueryResponse {
    #[serde(default)]
    document: Option<Document>,
}

pub struct FirestoreReferralStore {
    client: Client,
    config: FirestoreConfig,
}

impl FirestoreReferralStore {
    pub fn new(client: Client, config: FirestoreConfig) -> Self {
        Self { client, config }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }

    async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        let url = format!("{}/{}", self.config.documents_url(), path);
        let response = self.authorize(self.client.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.json().await?))
    }

    async fn patch_document(&self, path: &str, body: Value, mask: &[&str]) -> Result<()> {
        let url = format!("{}/{}", self.config.documents_url(), path);
        let mask = mask
            .iter()
            .map(|field| ("updateMask.fieldPaths", *field))
            .collect::<Vec<_>>();
        self.authorize(self.client.patch(url))
            .query(&mask)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl ReferralStore for FirestoreReferralStore {
    async fn get_referrer(&self, wallet: &Pubkey) -> Result<Option<Pubkey>> {
        let url = format!("{}:runQuery", self.config.documents_url());
        let responses: Vec<RunQueryResponse> = self
            .authorize(self.client.post(url))
            .json(&invitee_query(wallet))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_referrer(responses)
    }

    async fn record_reward(&self, record: RewardRecord) -> Result<()> {
        let now = Utc::now();
        let url = format!("{}/rewardHistory", self.config.documents_url());
        self.authorize(self.client.post(url))
            .json(&reward_history_document(&record, now))
            .send()
            .await?
            .error_for_status()?;

        let path = format!("inviteStats/{}", record.wallet_address);
        let existing = self.get_document(&path).await?;
        let (body, mask) = invite_stats_update(existing.as_ref(), &record, now);
        self.patch_document(&path, body, mask).await?;

        tracing::info!(
            referrer = %record.wallet_address,
            lamports = record.amount,
            signature = %record.tx_signature,
            "Recorded referral reward"
        );
        Ok(())
    }
}

fn invitee_query(wallet: &Pubkey) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": "invitations" }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "invitees" },
                    "op": "ARRAY_CONTAINS",
                    "value": { "stringValue": wallet.to_string() }
                }
            },
            "limit": 1
        }
    })
}

fn parse_referrer(responses: Vec<RunQueryResponse>) -> Result<Option<Pubkey>> {
    let inviter = responses
        .iter()
        .filter_map(|response| response.document.as_ref())
        .find_map(|document| document.string("inviterWallet"));

    inviter
        .map(|address| {
            Pubkey::from_str(address)
                .map_err(|_| ReclaimError::Store(format!("invalid inviter wallet {address}")))
        })
        .transpose()
}

fn timestamp(now: DateTime<Utc>) -> Value {
    json!({ "timestampValue": now.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

fn reward_history_document(record: &RewardRecord, now: DateTime<Utc>) -> Value {
    json!({
        "fields": {
            "walletAddress": { "stringValue": record.wallet_address.to_string() },
            "amount": { "doubleValue": lamports_to_sol(record.amount) },
            "txSignature": { "stringValue": record.tx_signature.to_string() },
            "timestamp": timestamp(now),
        }
    })
}

fn invite_stats_update(
    existing: Option<&Document>,
    record: &RewardRecord,
    now: DateTime<Utc>,
) -> (Value, &'static [&'static str]) {
    let amount = lamports_to_sol(record.amount);
    match existing {
        Some(document) => {
            let total = document.number("totalRewards").unwrap_or(0.0) + amount;
            (
                json!({
                    "fields": {
                        "totalRewards": { "doubleValue": total },
                        "lastRewardAt": timestamp(now),
                    }
                }),
                STATS_UPDATE_MASK,
            )
        }
        None => (
            json!({
                "fields": {
                    "walletAddress": { "stringValue": record.wallet_address.to_string() },
                    "totalInvites": { "integerValue": "0" },
                    "totalRewards": { "doubleValue": amount },
                    "lastInviteAt": timestamp(now),
                    "lastRewardAt": timestamp(now),
                }
            }),
            CREATE_MASK,
        ),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        solana_sdk::signature::Signature,
    };

    fn record(amount: u64) -> RewardRecord {
        RewardRecord {
            wallet_address: Pubkey::new_unique(),
            amount,
            tx_signature: Signature::default(),
        }
    }

    #[test]
    fn test_documents_url() {
        let config = FirestoreConfig {
            base_url:   "http://localhost:8080/v1/".to_string(),
            project_id: "solclaims".to_string(),
            api_key:    None,
        };
        assert_eq!(
            config.documents_url(),
            "http://localhost:8080/v1/projects/solclaims/databases/(default)/documents"
        );
    }

    #[test]
    fn test_parse_referrer() {
        let inviter = Pubkey::new_unique();
        let responses: Vec<RunQueryResponse> = serde_json::from_value(json!([
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/invitations/AB12CD34",
                    "fields": {
                        "inviterWallet": { "stringValue": inviter.to_string() },
                        "inviteCode": { "stringValue": "AB12CD34" },
                        "invitees": { "arrayValue": { "values": [] } }
                    }
                },
                "readTime": "2024-12-01T00:00:00.000000Z"
            }
        ]))
        .unwrap();
        assert_eq!(parse_referrer(responses).unwrap(), Some(inviter));
    }

    #[test]
    fn test_parse_no_referrer() {
        // an empty result set still carries a readTime entry
        let responses: Vec<RunQueryResponse> =
            serde_json::from_value(json!([{ "readTime": "2024-12-01T00:00:00.000000Z" }]))
                .unwrap();
        assert_eq!(parse_referrer(responses).unwrap(), None);
    }

    #[test]
    fn test_parse_invalid_referrer() {
        let responses: Vec<RunQueryResponse> = serde_json::from_value(json!([
            { "document": { "fields": { "inviterWallet": { "stringValue": "nope" } } } }
        ]))
        .unwrap();
        assert!(matches!(
            parse_referrer(responses),
            Err(ReclaimError::Store(_))
        ));
    }

    #[test]
    fn test_reward_history_document() {
        let record = record(400_000);
        let document = reward_history_document(&record, Utc::now());
        assert_eq!(
            document["fields"]["walletAddress"]["stringValue"],
            record.wallet_address.to_string()
        );
        assert_eq!(document["fields"]["amount"]["doubleValue"], 0.0004);
    }

    #[test]
    fn test_stats_update_accumulates() {
        let existing: Document = serde_json::from_value(json!({
            "fields": { "totalRewards": { "doubleValue": 0.5 } }
        }))
        .unwrap();
        let (body, mask) = invite_stats_update(Some(&existing), &record(250_000_000), Utc::now());
        assert_eq!(body["fields"]["totalRewards"]["doubleValue"], 0.75);
        assert_eq!(mask, &["totalRewards", "lastRewardAt"]);

        let existing: Document = serde_json::from_value(json!({
            "fields": { "totalRewards": { "integerValue": "1" } }
        }))
        .unwrap();
        let (body, _) = invite_stats_update(Some(&existing), &record(500_000_000), Utc::now());
        assert_eq!(body["fields"]["totalRewards"]["doubleValue"], 1.5);
    }

    #[test]
    fn test_stats_created_when_missing() {
        let (body, mask) = invite_stats_update(None, &record(100_000_000), Utc::now());
        assert!(mask.is_empty());
        assert_eq!(body["fields"]["totalInvites"]["integerValue"], "0");
        assert_eq!(body["fields"]["totalRewards"]["doubleValue"], 0.1);
    }
}
