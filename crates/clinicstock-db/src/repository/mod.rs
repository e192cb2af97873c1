//! # Repository Module
//!
//! Database repository implementations for ClinicStock.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Tenant-Scoped Repositories                           │
//! │                                                                         │
//! │  Route handler                                                         │
//! │       │                                                                 │
//! │       │  db.items().insert(org_id, &new_item)                          │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── validate input          (clinicstock_core::validation)           │
//! │  ├── check plan capacity     (clinicstock_core::plan)                 │
//! │  └── SQL, always filtered by organization_id                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method takes the caller's `organization_id` first. A record that
//! belongs to another organization is reported as not found.
//!
//! ## Available Repositories
//!
//! - [`OrganizationRepository`](organization::OrganizationRepository) - Organizations, settings, plan tier
//! - [`CategoryRepository`](catalog::CategoryRepository) - Item categories
//! - [`LocationRepository`](catalog::LocationRepository) - Storage locations (plan-capped)
//! - [`MemberRepository`](member::MemberRepository) - Team members (plan-capped)
//! - [`ItemRepository`](item::ItemRepository) - Inventory items (plan-capped)

use sqlx::{Executor, Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

pub mod catalog;
pub mod item;
pub mod member;
pub mod organization;

/// Starts a transaction that takes SQLite's write lock up front.
///
/// Read-then-write transactions (count, then insert) must use this. A
/// deferred transaction that upgrades from read to write fails with
/// "database is locked" when another writer got there first, instead of
/// waiting out the busy timeout.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Counts one organization's rows in a tenant table.
///
/// `table` is always a literal from this crate, never user input.
pub(crate) async fn count_for_organization<'e, E>(
    executor: E,
    table: &'static str,
    organization_id: &str,
) -> DbResult<u32>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT COUNT(*) FROM {} WHERE organization_id = ?1", table);
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(organization_id)
        .fetch_one(executor)
        .await?;

    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}
