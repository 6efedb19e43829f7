//! # Storefront Application Library
//!
//! Command and query handlers for Sales, Carts and Products.
//!
//! ## Module Organization
//! ```text
//! storefront_app/
//! ├── lib.rs          ◄─── You are here (Storefront context)
//! ├── config.rs       ◄─── Environment configuration
//! ├── telemetry.rs    ◄─── tracing subscriber setup
//! ├── error.rs        ◄─── AppError and outward error codes
//! ├── orders/
//! │   ├── mod.rs      ◄─── OrderService<K> (sales and carts)
//! │   ├── commands.rs ◄─── Create/update/list inputs and their rules
//! │   └── results.rs  ◄─── DTOs returned to the caller
//! ├── products.rs     ◄─── ProductService and its DTOs
//! └── bin/seed.rs     ◄─── Sample data loader
//! ```
//!
//! ## Handler Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Storefront::connect(&config)                                          │
//! │       │                                                                 │
//! │       ├── sales()    ──► SaleService    ─┐                              │
//! │       ├── carts()    ──► CartService     ├─► fresh repository per call  │
//! │       └── products() ──► ProductService ─┘   validate → load → mutate  │
//! │                                              → save → DTO              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod orders;
pub mod products;
pub mod telemetry;

use tracing::info;

use storefront_db::Database;

pub use config::{AppConfig, ConfigError};
pub use error::{AppError, AppResult, ErrorCode, ErrorResponse};
pub use orders::{CartService, OrderService, OrderWorkflow, SaleService};
pub use products::ProductService;

/// Shared handle to the store plus the settings every handler needs.
///
/// Cloning is cheap; the pool inside [`Database`] is reference counted.
#[derive(Debug, Clone)]
pub struct Storefront {
    db: Database,
    default_page_size: u32,
}

impl Storefront {
    /// Wraps an already opened database.
    pub fn new(db: Database, default_page_size: u32) -> Self {
        Storefront {
            db,
            default_page_size,
        }
    }

    /// Opens the database described by `config` and runs migrations.
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        info!(path = %config.database_path.display(), "Opening storefront database");
        let db = Database::new(config.db_config()).await?;
        Ok(Storefront::new(db, config.default_page_size))
    }

    pub fn sales(&self) -> SaleService {
        OrderService::new(self.db.clone(), self.default_page_size)
    }

    pub fn carts(&self) -> CartService {
        OrderService::new(self.db.clone(), self.default_page_size)
    }

    pub fn products(&self) -> ProductService {
        ProductService::new(self.db.clone(), self.default_page_size)
    }

    /// The underlying store, for diagnostics.
    pub fn database(&self) -> &Database {
        &self.db
    }
}
