//! Read-side facade used by the listener and admin queries.

use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Deserialize;

use crate::db::entity::{received_payment, sent_transaction};
use crate::db::{DbResult, Driver};

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;

/// Page selection for list queries, 1-based.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl Pagination {
    fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    fn offset(&self) -> u64 {
        self.page.unwrap_or(1).max(1).saturating_sub(1) * self.limit()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: Some(1),
            limit: Some(DEFAULT_LIMIT),
        }
    }
}

/// Read queries against domain records.
#[derive(Clone)]
pub struct Repository {
    driver: Arc<dyn Driver>,
}

impl Repository {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Paging token of the most recently recorded payment.
    pub async fn last_cursor(&self) -> DbResult<Option<String>> {
        let db = self.driver.connection()?;
        let last = received_payment::Entity::find()
            .order_by_desc(received_payment::Column::Id)
            .one(db)
            .await?;
        Ok(last.map(|payment| payment.paging_token))
    }

    /// Newest first.
    pub async fn received_payments(
        &self,
        pagination: Pagination,
    ) -> DbResult<Vec<received_payment::Model>> {
        let db = self.driver.connection()?;
        let rows = received_payment::Entity::find()
            .order_by_desc(received_payment::Column::Id)
            .offset(pagination.offset())
            .limit(pagination.limit())
            .all(db)
            .await?;
        Ok(rows)
    }

    pub async fn received_payment(&self, id: i32) -> DbResult<Option<received_payment::Model>> {
        let db = self.driver.connection()?;
        Ok(received_payment::Entity::find_by_id(id).one(db).await?)
    }

    pub async fn received_payment_by_operation_id(
        &self,
        operation_id: &str,
    ) -> DbResult<Option<received_payment::Model>> {
        let db = self.driver.connection()?;
        let row = received_payment::Entity::find()
            .filter(received_payment::Column::OperationId.eq(operation_id))
            .one(db)
            .await?;
        Ok(row)
    }

    /// Newest first.
    pub async fn sent_transactions(
        &self,
        pagination: Pagination,
    ) -> DbResult<Vec<sent_transaction::Model>> {
        let db = self.driver.connection()?;
        let rows = sent_transaction::Entity::find()
            .order_by_desc(sent_transaction::Column::Id)
            .offset(pagination.offset())
            .limit(pagination.limit())
            .all(db)
            .await?;
        Ok(rows)
    }
}
