//! Application state

use std::sync::Arc;

use gymbook_billing::{BillingConfig, BillingService};
use gymbook_shared::{Config, GymStore, InMemoryGymStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GymStore>,
    pub billing: Arc<BillingService>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn GymStore>, config: Config) -> Self {
        let billing = Arc::new(BillingService::new(
            BillingConfig {
                due_day: config.due_day,
            },
            store.clone(),
        ));
        tracing::info!(due_day = config.due_day, "Billing engine initialized");

        Self {
            store,
            billing,
            config,
        }
    }

    /// State backed by the bundled in-memory store, used by the binary
    /// until an external document store is wired in, and by tests.
    pub fn in_memory(config: Config) -> Self {
        Self::new(Arc::new(InMemoryGymStore::default()), config)
    }
}
