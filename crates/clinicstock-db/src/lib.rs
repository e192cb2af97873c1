//! # clinicstock-db: Database Layer for ClinicStock
//!
//! SQLite storage for organizations, catalog, team and inventory, plus the
//! report service that feeds stored records to the status engine in
//! `clinicstock-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ClinicStock Data Flow                            │
//! │                                                                         │
//! │  Route handler (dashboard, alerts digest, waste page)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  clinicstock-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  org, items,  │    │  (embedded)  │  │   │
//! │  │   │               │◄───│  catalog,     │    │ 001_init.sql │  │   │
//! │  │   │  SqlitePool   │    │  members      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           ▲                                                     │   │
//! │  │           │            ┌──────────────────────────────────┐    │   │
//! │  │           └────────────│ InventoryReportService (report)  │    │   │
//! │  │                        │ overview • waste • alerts        │    │   │
//! │  │                        └──────────────────────────────────┘    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Tenant-scoped repositories
//! - [`report`] - Status reports over stored inventory
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clinicstock_db::{AppConfig, Database};
//!
//! let config = AppConfig::load()?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let org = db.organizations().create("Glow Aesthetics", PlanTier::Starter).await?;
//! let overview = db.reports().overview(&org.id, Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod report;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use report::{InventoryOverview, InventoryReportService};

// Repository re-exports for convenience
pub use repository::catalog::{CategoryRepository, LocationRepository};
pub use repository::item::ItemRepository;
pub use repository::member::MemberRepository;
pub use repository::organization::OrganizationRepository;
