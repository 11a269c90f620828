use {
    crate::error::Result,
    reqwest::Client,
    serde::{
        Deserialize,
        Serialize,
    },
    std::time::Duration,
};

pub const LOG_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// One completed closure as reported by the public log endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogItem {
    pub id:          u64,
    pub wallet:      String,
    pub wallet_name: String,
    pub referral:    Option<String>,
    pub accounts:    u64,
    pub lamports:    u64,
    pub confirmed:   u64,
    pub destination: u64,
    pub tx:          String,
    pub created_at:  String,
    pub updated_at:  String,
}

#[derive(Debug, Deserialize)]
pub struct LogPage {
    pub current_page: u64,
    pub data:         Vec<LogItem>,
    pub last_page:    u64,
    pub total:        u64,
}

#[derive(Debug, Deserialize)]
struct LogResponse {
    #[allow(dead_code)]
    status:  String,
    message: LogPage,
}

pub struct LogsApi {
    client:   Client,
    base_url: String,
}

impl LogsApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn fetch_page(&self, page: u64) -> Result<LogPage> {
        let url = format!("{}/logs", self.base_url.trim_end_matches('/'));
        let response: LogResponse = self
            .client
            .get(url)
            .query(&[("page", page)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.message)
    }

    pub async fn fetch_logs(&self, page: u64) -> Result<Vec<LogItem>> {
        Ok(self.fetch_page(page).await?.data)
    }
}

/// Tracks the newest transaction seen so a poller only reports changes.
#[derive(Debug, Default)]
pub struct LogFeed {
    items: Vec<LogItem>,
}

impl LogFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fresh items when this is the first non-empty poll or the
    /// newest transaction differs from the previous one.
    pub fn update(&mut self, items: Vec<LogItem>) -> Option<&[LogItem]> {
        let newest = |items: &[LogItem]| items.first().map(|item| item.tx.clone());
        if !self.items.is_empty() && newest(&self.items) == newest(&items) {
            return None;
        }
        if self.items.is_empty() && items.is_empty() {
            return None;
        }
        self.items = items;
        Some(&self.items)
    }

    pub fn items(&self) -> &[LogItem] {
        &self.items
    }
}
