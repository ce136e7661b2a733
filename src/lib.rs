use std::{sync::Arc, time::Duration};

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{ai, auth, cache, db, feed, imaging, limiter, storage, utils};

use ai::AiService;
use auth::jwt::SessionTokenService;
use cache::ViewCache;
use feed::ChangeFeed;
use limiter::RateLimiter;
use repositories::event::EventRepository;
use storage::ObjectStorage;
use use_cases::{ai::AiHandler, content::ContentHandler, events::EventHandler, session::SessionHandler};

/// Rate-limit buckets untouched for this long are dropped.
const LIMITER_IDLE_TTL: Duration = Duration::from_secs(10 * 60);

pub struct AppState {
    pub event_handler: EventHandler,
    pub content_handler: ContentHandler,
    pub session_handler: AppSessionHandler,
    pub ai_handler: AiHandler,
    pub event_repo: Arc<dyn EventRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub view_cache: Arc<ViewCache>,
    pub change_feed: ChangeFeed,
    pub rate_limiter: RateLimiter,
    pub trust_forwarded_for: bool,
}

pub type AppSessionHandler = SessionHandler<SessionTokenService>;

impl AppState {
    pub fn new(
        config: &settings::AppConfig,
        event_repo: Arc<dyn EventRepository>,
        storage: Arc<dyn ObjectStorage>,
        ai_service: Arc<dyn AiService>,
    ) -> Self {
        let view_cache = Arc::new(ViewCache::new(config.view_cache_ttl()));
        let change_feed = ChangeFeed::default();

        let event_handler = EventHandler::new(
            event_repo.clone(),
            storage.clone(),
            view_cache.clone(),
            change_feed.clone(),
        );
        let content_handler = ContentHandler::new(
            event_repo.clone(),
            storage.clone(),
            view_cache.clone(),
            change_feed.clone(),
        );
        let session_handler = SessionHandler::new(
            SessionTokenService::new(config),
            config.access_password_hash.clone(),
        );
        let ai_handler = AiHandler::new(ai_service, event_repo.clone(), storage.clone());

        AppState {
            event_handler,
            content_handler,
            session_handler,
            ai_handler,
            event_repo,
            storage,
            view_cache,
            change_feed,
            rate_limiter: RateLimiter::per_minute(config.rate_limit_per_minute, LIMITER_IDLE_TTL),
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }
}
