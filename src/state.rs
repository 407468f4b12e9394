use std::sync::Arc;

use crate::catalog::SoftwareCatalog;
use crate::registry::KeyRegistry;
use crate::store::{SqliteStore, UserStore};
use crate::token::TokenIssuer;

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: SoftwareCatalog,
    pub registry: KeyRegistry,
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenIssuer,
}

impl AppState {
    /// Wire all components against one SQLite store.
    pub fn new(store: SqliteStore, tokens: TokenIssuer) -> Self {
        let store = Arc::new(store);
        let registry = KeyRegistry::new(store.clone(), store.clone());
        let catalog = SoftwareCatalog::new(store.clone(), registry.clone());
        Self {
            catalog,
            registry,
            users: store,
            tokens,
        }
    }
}
