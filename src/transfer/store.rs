//! Transfer ledger persistence
//!
//! Header and items are written in one transaction: either the whole
//! transfer is recorded or nothing is.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::error::TransferError;
use super::types::{HU_QUANTITY, NewTransfer, TransferHeader, TransferItem, TransferRecord};

#[async_trait]
pub trait TransferStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Write header and items atomically
    async fn insert(&self, transfer: &NewTransfer) -> Result<TransferRecord, TransferError>;

    /// Newest first (`created_at`, then `id`), at most `limit` headers
    async fn recent(&self, limit: u32) -> Result<Vec<TransferRecord>, TransferError>;
}

/// PostgreSQL ledger (`transfer_headers` / `transfer_items`)
pub struct PgTransferStore {
    pool: PgPool,
}

impl PgTransferStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_header(row: &PgRow) -> Result<TransferHeader, TransferError> {
        Ok(TransferHeader {
            id: row.try_get("id")?,
            source_sloc_id: row.try_get("source_sloc_id")?,
            destination_sloc_id: row.try_get("destination_sloc_id")?,
            user_id: row.try_get("user_id")?,
            sap_document_number: row.try_get("sap_document_number")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<TransferItem, TransferError> {
        Ok(TransferItem {
            id: row.try_get("id")?,
            transfer_header_id: row.try_get("transfer_header_id")?,
            handling_unit: row.try_get("handling_unit")?,
            description: row.try_get("description")?,
            quantity: row.try_get("quantity")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl TransferStore for PgTransferStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, transfer: &NewTransfer) -> Result<TransferRecord, TransferError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO transfer_headers
                (source_sloc_id, destination_sloc_id, user_id, sap_document_number, created_at, updated_at)
            VALUES
                ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, source_sloc_id, destination_sloc_id, user_id, sap_document_number,
                      created_at, updated_at
            "#,
        )
        .bind(&transfer.source_sloc)
        .bind(&transfer.destination_sloc)
        .bind(transfer.user_id)
        .bind(&transfer.sap_document_number)
        .fetch_one(&mut *tx)
        .await?;
        let header = Self::row_to_header(&row)?;

        let mut items = Vec::with_capacity(transfer.items.len());
        for line in &transfer.items {
            let row = sqlx::query(
                r#"
                INSERT INTO transfer_items
                    (transfer_header_id, handling_unit, description, quantity, created_at, updated_at)
                VALUES
                    ($1, $2, $3, $4, NOW(), NOW())
                RETURNING id, transfer_header_id, handling_unit, description, quantity,
                          created_at, updated_at
                "#,
            )
            .bind(header.id)
            .bind(&line.handling_unit)
            .bind(&line.description)
            .bind(HU_QUANTITY)
            .fetch_one(&mut *tx)
            .await?;
            items.push(Self::row_to_item(&row)?);
        }

        tx.commit().await?;

        Ok(TransferRecord { header, items })
    }

    async fn recent(&self, limit: u32) -> Result<Vec<TransferRecord>, TransferError> {
        let rows = sqlx::query(
            r#"
            SELECT id, source_sloc_id, destination_sloc_id, user_id, sap_document_number,
                   created_at, updated_at
            FROM transfer_headers
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let headers = rows
            .iter()
            .map(Self::row_to_header)
            .collect::<Result<Vec<_>, _>>()?;
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = headers.iter().map(|h| h.id).collect();
        let item_rows = sqlx::query(
            r#"
            SELECT id, transfer_header_id, handling_unit, description, quantity,
                   created_at, updated_at
            FROM transfer_items
            WHERE transfer_header_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_header: HashMap<i64, Vec<TransferItem>> = HashMap::new();
        for row in &item_rows {
            let item = Self::row_to_item(row)?;
            by_header.entry(item.transfer_header_id).or_default().push(item);
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let items = by_header.remove(&header.id).unwrap_or_default();
                TransferRecord { header, items }
            })
            .collect())
    }
}

#[derive(Default)]
struct MemoryLedger {
    next_header_id: i64,
    next_item_id: i64,
    records: Vec<TransferRecord>,
}

/// In-process ledger, used when no database is configured and in tests
#[derive(Default)]
pub struct MemoryTransferStore {
    ledger: Mutex<MemoryLedger>,
    fail_writes: AtomicBool,
}

impl MemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `insert` fail without writing anything
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryLedger> {
        self.ledger
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl TransferStore for MemoryTransferStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, transfer: &NewTransfer) -> Result<TransferRecord, TransferError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransferError::DatabaseError(
                "transfer ledger is not accepting writes".to_string(),
            ));
        }

        let now = Utc::now();
        let mut ledger = self.lock();

        ledger.next_header_id += 1;
        let header = TransferHeader {
            id: ledger.next_header_id,
            source_sloc_id: transfer.source_sloc.clone(),
            destination_sloc_id: transfer.destination_sloc.clone(),
            user_id: transfer.user_id,
            sap_document_number: Some(transfer.sap_document_number.clone()),
            created_at: now,
            updated_at: now,
        };

        let mut items = Vec::with_capacity(transfer.items.len());
        for line in &transfer.items {
            ledger.next_item_id += 1;
            items.push(TransferItem {
                id: ledger.next_item_id,
                transfer_header_id: header.id,
                handling_unit: line.handling_unit.clone(),
                description: line.description.clone(),
                quantity: HU_QUANTITY,
                created_at: now,
                updated_at: now,
            });
        }

        let record = TransferRecord { header, items };
        ledger.records.push(record.clone());
        Ok(record)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<TransferRecord>, TransferError> {
        let ledger = self.lock();
        let mut records = ledger.records.clone();
        records.sort_by(|a, b| {
            b.header
                .created_at
                .cmp(&a.header.created_at)
                .then(b.header.id.cmp(&a.header.id))
        });
        records.truncate(limit as usize);
        Ok(records)
    }
}
