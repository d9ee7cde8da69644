//! Read-only view of recorded transfers

use std::sync::Arc;

use super::error::TransferError;
use super::store::TransferStore;
use super::types::TransferRecord;

pub const MAX_HISTORY_LIMIT: u32 = 200;

pub struct HistoryReader {
    store: Arc<dyn TransferStore>,
    default_limit: u32,
}

impl HistoryReader {
    pub fn new(store: Arc<dyn TransferStore>, default_limit: u32) -> Self {
        Self {
            store,
            default_limit: default_limit.clamp(1, MAX_HISTORY_LIMIT),
        }
    }

    /// Effective limit for a requested one: default when absent, clamped to 1..=200
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, MAX_HISTORY_LIMIT)
    }

    /// Newest transfers first, with their items
    pub async fn list_recent(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<TransferRecord>, TransferError> {
        let limit = self.effective_limit(limit);
        let records = self.store.recent(limit).await?;
        tracing::debug!(limit, count = records.len(), "Transfer history read");
        Ok(records)
    }
}
