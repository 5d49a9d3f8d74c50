//! Service layer tying the repositories together.

pub mod accounts;
pub mod catalog;
pub mod circulation;
pub mod session;

pub use accounts::AccountsService;
pub use catalog::CatalogService;
pub use circulation::CirculationService;
pub use session::{LoginOutcome, Session};

use crate::{config::AppConfig, repository::Library};

/// All services over one store client.
#[derive(Clone)]
pub struct Services {
    pub catalog: CatalogService,
    pub accounts: AccountsService,
    pub circulation: CirculationService,
}

impl Services {
    pub fn new(library: Library, config: &AppConfig) -> Self {
        Self {
            catalog: CatalogService::new(library.clone()),
            accounts: AccountsService::new(library.clone(), config.admin.clone()),
            circulation: CirculationService::new(library),
        }
    }
}
