use anyhow::Result;
use axum::http::Method;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::analytics::{ClickRecorder, GeoLookup, IpApiResolver, StatsAggregator};
use crate::api::create_api_router;
use crate::config::Config;
use crate::redirect::preview::PreviewFetcher;
use crate::redirect::{create_redirect_router, RedirectService};
use crate::shortener::ShortenService;
use crate::storage::Storage;

/// Services shared by every handler
pub struct AppState {
    pub shortener: ShortenService,
    pub redirect: RedirectService,
    pub stats: StatsAggregator,
}

impl AppState {
    /// Wire the services with the ip-api geo resolver from `config`
    pub fn new(storage: Arc<dyn Storage>, config: &Config) -> Result<Self> {
        let geo: Arc<dyn GeoLookup> = Arc::new(IpApiResolver::new(&config.analytics)?);
        Self::with_geo(storage, config, geo)
    }

    /// Wire the services with an explicit geo resolver
    pub fn with_geo(
        storage: Arc<dyn Storage>,
        config: &Config,
        geo: Arc<dyn GeoLookup>,
    ) -> Result<Self> {
        let recorder = ClickRecorder::new(Arc::clone(&storage), geo, config.site.debug);
        let fetcher = PreviewFetcher::new(&config.preview)?;

        Ok(Self {
            shortener: ShortenService::new(
                Arc::clone(&storage),
                config.site.base_url.clone(),
                config.shortener.max_attempts,
            ),
            redirect: RedirectService::new(
                Arc::clone(&storage),
                recorder,
                fetcher,
                config.site.base_url.clone(),
                config.site.domain.clone(),
            ),
            stats: StatsAggregator::new(storage, config.site.domain.clone()),
        })
    }
}

/// The complete HTTP application: API and redirect routes behind CORS and
/// request tracing.
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers(Any);

    create_api_router(Arc::clone(&state))
        .merge(create_redirect_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
