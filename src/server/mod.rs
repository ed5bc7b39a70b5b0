pub mod error;
pub mod handlers;

use crate::apis::{CurseForgeSource, ModSource, ModrinthSource};
use crate::storage::Storage;
use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use error::ApiError;

/// Shared handles every handler needs
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub curseforge: Arc<CurseForgeSource>,
    pub modrinth: Arc<ModrinthSource>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Storage>,
        curseforge: CurseForgeSource,
        modrinth: ModrinthSource,
    ) -> Self {
        Self {
            store,
            curseforge: Arc::new(curseforge),
            modrinth: Arc::new(modrinth),
        }
    }

    /// Every source, in ingestion order
    pub fn sources(&self) -> Vec<Arc<dyn ModSource>> {
        vec![
            self.curseforge.clone() as Arc<dyn ModSource>,
            self.modrinth.clone() as Arc<dyn ModSource>,
        ]
    }
}

/// Create the HTTP router with all catalog, ingestion and auth routes
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/versions", get(handlers::list_versions))
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/mods", get(handlers::search_mods))
        .route("/api/mods/popular", get(handlers::popular_mods))
        .route("/api/mods/latest", get(handlers::latest_mods))
        .route("/api/mods/:id", get(handlers::get_mod))
        .route("/api/mods/:id/download", post(handlers::download_mod))
        // Ingestion triggers
        .route("/api/parse/curseforge", get(handlers::parse_curseforge))
        .route("/api/parse/modrinth", get(handlers::parse_modrinth))
        .route(
            "/api/parse/modrinth/page/:page",
            get(handlers::parse_modrinth_page),
        )
        .route("/api/parse/all", get(handlers::parse_all))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/user", get(handlers::current_user))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_server(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server running on http://localhost:{}", port);
    info!("Health check: http://localhost:{}/health", port);

    Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}
