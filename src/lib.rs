//! Bibliotheca — a library-management core.
//!
//! Books, borrowers and loans persisted in an embedded store, with typed
//! search queries, derived borrowed-status, and a loan lifecycle that
//! enforces one open loan per book and a per-borrower quota. The crate is
//! the data and rules layer only; any user interface lives elsewhere.
//!
//! ```no_run
//! use bibliotheca::models::CreateBook;
//! use bibliotheca::{AppConfig, Library, Services};
//!
//! # async fn run() -> bibliotheca::AppResult<()> {
//! let config = AppConfig::load()?;
//! let library = Library::connect(&config).await?;
//! let services = Services::new(library, &config);
//!
//! let id = services
//!     .catalog
//!     .add(&CreateBook::new("A Pickle for the Knowing Ones").pages(37))
//!     .await?;
//! let book = services.catalog.get(&id).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::Library;
pub use services::Services;

use tracing_subscriber::EnvFilter;

/// Initialize tracing from the logging configuration. `RUST_LOG` wins over
/// the configured level when set.
pub fn init_logging(config: &config::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.format == "compact" {
        builder.compact().init();
    } else {
        builder.pretty().init();
    }
}
