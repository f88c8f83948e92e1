mod handlers;
pub mod middleware;

use axum::{
    extract::FromRef,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use tokio::sync::broadcast;

use crate::db::Database;
use crate::docstore::{DocumentStore, PlantDocService};

pub use middleware::{RateLimiter, SecurityConfig};

/// Shared handler state. Handlers extract the part they need through
/// `State<Database>` or `State<PlantDocService>`.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub docs: PlantDocService,
    /// Fired on server shutdown; ends open event streams.
    pub shutdown: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(db: Database, app_id: impl Into<String>) -> Self {
        let docs = PlantDocService::new(DocumentStore::new(db.clone()), app_id);
        let (shutdown, _) = broadcast::channel(1);
        Self { db, docs, shutdown }
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for PlantDocService {
    fn from_ref(state: &AppState) -> Self {
        state.docs.clone()
    }
}

/// Router with no authentication, rate limiting or CORS restrictions.
pub fn create_router(state: AppState) -> Router {
    create_router_with_security(state, SecurityConfig::disabled())
}

pub fn create_router_with_security(state: AppState, security: SecurityConfig) -> Router {
    let api = Router::new()
        // Users
        .route("/users", post(handlers::create_user))
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/users/{id}/profile", get(handlers::get_profile))
        // Moods
        .route(
            "/users/{id}/moods",
            get(handlers::list_moods).post(handlers::create_mood),
        )
        .route("/users/{id}/moods/latest", get(handlers::latest_mood))
        .route("/users/{id}/moods/trend", get(handlers::mood_trend))
        .route(
            "/moods/{id}",
            get(handlers::get_mood).delete(handlers::delete_mood),
        )
        // Journal
        .route(
            "/users/{id}/journal",
            get(handlers::list_journal).post(handlers::create_journal_entry),
        )
        .route("/users/{id}/journal/prompts", get(handlers::journal_prompts))
        .route(
            "/journal/{id}",
            get(handlers::get_journal_entry)
                .put(handlers::update_journal_entry)
                .delete(handlers::delete_journal_entry),
        )
        // Plants
        .route(
            "/users/{id}/plants",
            get(handlers::list_plants).post(handlers::create_plant),
        )
        .route(
            "/plants/{id}",
            get(handlers::get_plant)
                .put(handlers::update_plant)
                .delete(handlers::delete_plant),
        )
        .route("/plants/{id}/water", post(handlers::water_plant))
        .route("/plants/{id}/fertilize", post(handlers::fertilize_plant))
        .route("/plants/{id}/music", post(handlers::play_music))
        .route("/plants/{id}/logs", get(handlers::plant_logs))
        // Reminders
        .route(
            "/users/{id}/reminders",
            get(handlers::list_reminders).post(handlers::create_reminder),
        )
        .route("/reminders/dispatch", post(handlers::dispatch_reminders))
        .route(
            "/reminders/{id}",
            get(handlers::get_reminder)
                .put(handlers::update_reminder)
                .delete(handlers::delete_reminder),
        )
        // Shared plant documents
        .route("/plant-docs", get(handlers::list_public_plants))
        .route(
            "/plant-docs/{user_id}",
            get(handlers::get_plant_doc)
                .put(handlers::put_plant_doc)
                .delete(handlers::delete_plant_doc),
        )
        .route("/plant-docs/{user_id}/events", get(handlers::plant_doc_events))
        // Analysis
        .route("/analysis/sentiment", post(handlers::analyze_sentiment))
        .route("/analysis/music", post(handlers::analyze_music_features))
        .route("/analysis/unified", post(handlers::analyze_unified))
        .route("/analysis/scale/{value}", get(handlers::scale_level))
        // Health
        .route("/health", get(handlers::health));

    let cors = match &security.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    let mut router = Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(
            security.clone(),
            middleware::auth_middleware,
        ));

    if let Some(limiter) = security.rate_limiter.clone() {
        router = router.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router.layer(TraceLayer::new_for_http()).layer(cors)
}
