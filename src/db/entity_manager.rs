//! Write-side facade over the bridge tables.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::db::entity::{received_payment, sent_transaction};
use crate::db::{DbResult, Driver};

/// A received payment about to be recorded.
#[derive(Debug, Clone)]
pub struct NewReceivedPayment {
    pub operation_id: String,
    pub paging_token: String,
    pub transaction_id: String,
    pub status: String,
    pub processed_at: DateTime<Utc>,
}

/// A transaction about to be submitted.
#[derive(Debug, Clone)]
pub struct NewSentTransaction {
    pub source: String,
    pub envelope: String,
    pub submitted_at: DateTime<Utc>,
}

/// Final state of a submitted transaction.
#[derive(Debug, Clone, Default)]
pub struct SentTransactionOutcome {
    pub status: String,
    pub transaction_hash: Option<String>,
    pub ledger: Option<i64>,
    pub result: Option<String>,
    pub succeeded_at: Option<DateTime<Utc>>,
}

/// Structured writes against domain records.
#[derive(Clone)]
pub struct EntityManager {
    driver: Arc<dyn Driver>,
}

impl EntityManager {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Insert a received payment, or update status and time of the row with
    /// the same operation id.
    pub async fn persist_received_payment(
        &self,
        payment: NewReceivedPayment,
    ) -> DbResult<received_payment::Model> {
        let db = self.driver.connection()?;
        let existing = received_payment::Entity::find()
            .filter(received_payment::Column::OperationId.eq(payment.operation_id.as_str()))
            .one(db)
            .await?;

        let model = match existing {
            Some(row) => {
                let mut active: received_payment::ActiveModel = row.into();
                active.status = Set(payment.status);
                active.processed_at = Set(payment.processed_at);
                active.update(db).await?
            }
            None => {
                received_payment::ActiveModel {
                    operation_id: Set(payment.operation_id),
                    paging_token: Set(payment.paging_token),
                    transaction_id: Set(payment.transaction_id),
                    status: Set(payment.status),
                    processed_at: Set(payment.processed_at),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };
        Ok(model)
    }

    /// Record a transaction in the `sending` state.
    pub async fn insert_sent_transaction(
        &self,
        transaction: NewSentTransaction,
    ) -> DbResult<sent_transaction::Model> {
        let db = self.driver.connection()?;
        let model = sent_transaction::ActiveModel {
            status: Set("sending".to_string()),
            source: Set(transaction.source),
            submitted_at: Set(transaction.submitted_at),
            envelope: Set(transaction.envelope),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(model)
    }

    pub async fn finish_sent_transaction(
        &self,
        id: i32,
        outcome: SentTransactionOutcome,
    ) -> DbResult<()> {
        let db = self.driver.connection()?;
        sent_transaction::Entity::update_many()
            .col_expr(sent_transaction::Column::Status, Expr::value(outcome.status))
            .col_expr(
                sent_transaction::Column::TransactionHash,
                Expr::value(outcome.transaction_hash),
            )
            .col_expr(sent_transaction::Column::Ledger, Expr::value(outcome.ledger))
            .col_expr(sent_transaction::Column::Result, Expr::value(outcome.result))
            .col_expr(
                sent_transaction::Column::SucceededAt,
                Expr::value(outcome.succeeded_at),
            )
            .filter(sent_transaction::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }
}
