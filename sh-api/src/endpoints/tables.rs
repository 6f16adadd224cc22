//! Untyped table access used by the migration tooling.

use sh_core::error::{ShError, ShResult};
use sh_core::constants::tables;

use crate::client::ApiClient;
use crate::query::{Order, Query};

fn known(table: &str) -> ShResult<()> {
    if tables::is_known(table) {
        Ok(())
    } else {
        Err(ShError::InvalidInput(format!("unknown table '{table}'")))
    }
}

impl ApiClient {
    /// One page of raw rows, in id order so pages are stable.
    pub async fn fetch_page(
        &self,
        table: &str,
        offset: u64,
        limit: u64,
    ) -> ShResult<Vec<serde_json::Value>> {
        known(table)?;
        let query = Query::new()
            .order("id", Order::Asc)
            .offset(offset)
            .limit(limit);
        self.select(table, &query).await
    }

    /// Exact row count of a table.
    pub async fn table_count(&self, table: &str) -> ShResult<u64> {
        known(table)?;
        self.count(table, &Query::new()).await
    }

    /// Upsert raw rows, merging on primary key.
    pub async fn upsert_rows(&self, table: &str, rows: &[serde_json::Value]) -> ShResult<()> {
        known(table)?;
        if rows.is_empty() {
            return Ok(());
        }
        self.upsert(table, rows).await
    }
}
