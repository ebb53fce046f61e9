//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use lettre::transport::smtp::Error as SmtpError;
use moka::future::Cache;
use sqlx::PgPool;

use mayombe_core::ProductId;
use mayombe_core::negotiation::OfferPolicy;
use mayombe_core::payout::PayoutPolicy;

use crate::config::MarketConfig;
use crate::content::{ContentError, ContentStore};
use crate::models::ProductDetail;
use crate::services::events::EventBus;
use crate::services::notify::Notifier;

/// Product detail cache lifetime.
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("smtp configuration error: {0}")]
    Smtp(#[from] SmtpError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MarketConfig,
    pool: PgPool,
    content: ContentStore,
    products: Cache<ProductId, ProductDetail>,
    events: EventBus,
    notifier: Notifier,
    offer_policy: OfferPolicy,
    payout_policy: PayoutPolicy,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Loads content pages and sets up the SMTP notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the content directory cannot be read or the SMTP
    /// relay is misconfigured.
    pub fn new(config: MarketConfig, pool: PgPool) -> Result<Self, StateError> {
        let content = ContentStore::load(&config.content_dir)?;
        tracing::info!(pages = content.len(), "Content loaded");

        let notifier = Notifier::new(config.email.as_ref(), pool.clone(), &config.base_url)?;

        let products = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                offer_policy: config.rules.offer_policy(),
                payout_policy: config.rules.payout_policy(),
                config,
                pool,
                content,
                products,
                events: EventBus::default(),
                notifier,
            }),
        })
    }

    /// Get a reference to the market configuration.
    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the content pages.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Product detail cache, invalidated on every product or rating write.
    #[must_use]
    pub fn product_cache(&self) -> &Cache<ProductId, ProductDetail> {
        &self.inner.products
    }

    /// Get a reference to the order event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Get a reference to the email notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Offer bounds from the configured marketplace rules.
    #[must_use]
    pub fn offer_policy(&self) -> OfferPolicy {
        self.inner.offer_policy
    }

    /// Commission and hold window from the configured marketplace rules.
    #[must_use]
    pub fn payout_policy(&self) -> PayoutPolicy {
        self.inner.payout_policy
    }
}
