//! Schema migrations.
//!
//! Migrations are grouped in named sets. Applied ids are recorded in
//! `bridge_migrations`, so running a set twice applies nothing the second time.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::{ColumnDef, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Set};

use crate::db::entity::{bridge_migration, received_payment, sent_transaction};
use crate::db::{DbError, DbResult};

/// Migration set holding the bridge schema.
pub const GATEWAY: &str = "gateway";

struct Migration {
    id: &'static str,
    up: fn() -> TableCreateStatement,
}

const GATEWAY_MIGRATIONS: &[Migration] = &[
    Migration {
        id: "1_create_received_payment",
        up: create_received_payment,
    },
    Migration {
        id: "2_create_sent_transaction",
        up: create_sent_transaction,
    },
];

fn migration_set(name: &str) -> Option<&'static [Migration]> {
    match name {
        GATEWAY => Some(GATEWAY_MIGRATIONS),
        _ => None,
    }
}

/// Apply every pending migration of `set`.
pub async fn migrate_up(db: &DatabaseConnection, set: &str) -> DbResult<usize> {
    let migrations =
        migration_set(set).ok_or_else(|| DbError::UnknownMigrationSet(set.to_string()))?;
    let backend = db.get_database_backend();

    db.execute(backend.build(&create_migration_table())).await?;

    let applied: HashSet<String> = bridge_migration::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|m| m.id)
        .collect();

    let mut count = 0;
    for migration in migrations {
        let id = format!("{}/{}", set, migration.id);
        if applied.contains(&id) {
            continue;
        }

        db.execute(backend.build(&(migration.up)())).await?;
        bridge_migration::Entity::insert(bridge_migration::ActiveModel {
            id: Set(id.clone()),
            applied_at: Set(Utc::now()),
        })
        .exec_without_returning(db)
        .await?;

        tracing::info!(migration = %id, "Applied migration");
        count += 1;
    }

    Ok(count)
}

fn create_migration_table() -> TableCreateStatement {
    Table::create()
        .table(bridge_migration::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(bridge_migration::Column::Id)
                .string_len(255)
                .not_null()
                .primary_key(),
        )
        .col(
            ColumnDef::new(bridge_migration::Column::AppliedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .to_owned()
}

fn create_received_payment() -> TableCreateStatement {
    Table::create()
        .table(received_payment::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(received_payment::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(received_payment::Column::OperationId)
                .string_len(255)
                .not_null()
                .unique_key(),
        )
        .col(
            ColumnDef::new(received_payment::Column::ProcessedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(received_payment::Column::PagingToken)
                .string_len(255)
                .not_null(),
        )
        .col(
            ColumnDef::new(received_payment::Column::Status)
                .string_len(255)
                .not_null(),
        )
        .col(
            ColumnDef::new(received_payment::Column::TransactionId)
                .string_len(64)
                .not_null(),
        )
        .to_owned()
}

fn create_sent_transaction() -> TableCreateStatement {
    Table::create()
        .table(sent_transaction::Entity)
        .if_not_exists()
        .col(
            ColumnDef::new(sent_transaction::Column::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(sent_transaction::Column::Status)
                .string_len(16)
                .not_null(),
        )
        .col(
            ColumnDef::new(sent_transaction::Column::Source)
                .string_len(56)
                .not_null(),
        )
        .col(
            ColumnDef::new(sent_transaction::Column::SubmittedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(sent_transaction::Column::SucceededAt)
                .timestamp_with_time_zone()
                .null(),
        )
        .col(
            ColumnDef::new(sent_transaction::Column::Ledger)
                .big_integer()
                .null(),
        )
        .col(
            ColumnDef::new(sent_transaction::Column::TransactionHash)
                .string_len(64)
                .null(),
        )
        .col(
            ColumnDef::new(sent_transaction::Column::Envelope)
                .text()
                .not_null(),
        )
        .col(ColumnDef::new(sent_transaction::Column::Result).text().null())
        .to_owned()
}
