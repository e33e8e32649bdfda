//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::ListingCache;
use crate::config::DashboardConfig;
use crate::db::{
    CustomerRepository, CustomerStore, InvoiceRepository, InvoiceStore, UserRepository, UserStore,
};
use crate::middleware::RouteMatcher;
use crate::services::invoices::InvoiceService;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid gate exclusion pattern: {0}")]
    InvalidExclusion(#[from] regex::Error),
}

/// The stores backing the dashboard.
#[derive(Clone)]
pub struct Stores {
    pub invoices: Arc<dyn InvoiceStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub users: Arc<dyn UserStore>,
}

impl Stores {
    /// `PostgreSQL`-backed stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            invoices: Arc::new(InvoiceRepository::new(pool.clone())),
            customers: Arc::new(CustomerRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the stores, listing cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    stores: Stores,
    listing_cache: ListingCache,
    route_matcher: RouteMatcher,
}

impl AppState {
    /// Create application state over `PostgreSQL`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured gate exclusion is not a valid regex.
    pub fn new(config: DashboardConfig, pool: &PgPool) -> Result<Self, StateError> {
        Self::with_stores(config, Stores::postgres(pool))
    }

    /// Create application state over the given stores.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured gate exclusion is not a valid regex.
    pub fn with_stores(config: DashboardConfig, stores: Stores) -> Result<Self, StateError> {
        let route_matcher = RouteMatcher::new(&config.gate_exclusions)?;
        let listing_cache = ListingCache::new(config.listing_cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                listing_cache,
                route_matcher,
            }),
        })
    }

    /// Get a reference to the dashboard configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// Get the invoice store.
    #[must_use]
    pub fn invoices(&self) -> &dyn InvoiceStore {
        self.inner.stores.invoices.as_ref()
    }

    /// Get the customer store.
    #[must_use]
    pub fn customers(&self) -> &dyn CustomerStore {
        self.inner.stores.customers.as_ref()
    }

    /// Get the user store.
    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.stores.users.as_ref()
    }

    /// Get the invoice listing cache.
    #[must_use]
    pub fn listing_cache(&self) -> &ListingCache {
        &self.inner.listing_cache
    }

    /// Get the gate's route matcher.
    #[must_use]
    pub fn route_matcher(&self) -> &RouteMatcher {
        &self.inner.route_matcher
    }

    /// Invoice service borrowing this state's stores and cache.
    #[must_use]
    pub fn invoice_service(&self) -> InvoiceService<'_> {
        InvoiceService::new(self.invoices(), self.customers(), self.listing_cache())
    }
}
