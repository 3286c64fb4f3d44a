//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::llm::LlmService;
use crate::matching::MatchEngine;
use crate::onboarding::OnboardingService;
use crate::places::PlacesService;
use crate::planner::Planner;
use crate::weather::WeatherService;
use crate::Result;

/// Start the API server
pub async fn serve_api(config: &AppConfig, host: String, port: u16, enable_cors: bool) -> Result<()> {
    info!("Starting vibematch API server...");

    // Initialize services
    let database = Arc::new(Database::from_config(config).await?);
    let engine = Arc::new(MatchEngine::with_oversample(
        database.clone(),
        config.oversample_factor(),
    ));
    let embedding_service = Arc::new(EmbeddingService::new(config)?);
    let llm_service = Arc::new(LlmService::new(config)?);
    let places_service = Arc::new(PlacesService::new(config)?);
    let weather_service = Arc::new(WeatherService::new(config)?);
    let planner = Arc::new(Planner::new(
        database.clone(),
        llm_service.clone(),
        places_service.clone(),
        config,
    ));
    let onboarding_service = Arc::new(OnboardingService::new(
        database.clone(),
        embedding_service.clone(),
        llm_service.clone(),
    ));

    let state = AppState {
        database,
        engine,
        embedding_service,
        llm_service,
        places_service,
        weather_service,
        planner,
        onboarding_service,
        default_match_limit: config.default_match_limit(),
    };

    // Build API routes with middleware layers
    let api_router = routes::api_routes(state);
    let mut app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    // Add CORS if enabled
    if enable_cors {
        info!("CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    // Start server
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{addr}");
    info!("Available endpoints:");
    info!("  GET  /api/health           - Health check");
    info!("  POST /api/onboarding       - Complete onboarding");
    info!("  GET  /api/profiles/:id     - Get profile by id");
    info!("  GET  /api/matches          - Ranked matches");
    info!("  GET  /api/match-details    - Why-matched + complementary strength");
    info!("  GET  /api/match-reasoning  - Why they vibe + shared tags");
    info!("  GET  /api/hangout-planner  - Hangout ideas");
    info!("  POST /api/location-mapper  - Map ideas to places");
    info!("  GET  /api/full-match-plan  - Reasoning + mapped ideas");
    info!("  POST /api/express-interest - Plan + map in one call");
    info!("  POST /api/reveal           - Preference-driven date ideas");
    info!("  GET  /api/weather          - 7-day forecast + best day");
    info!("  GET  /api/place-photo      - Place photo proxy");

    axum::serve(listener, app).await?;

    Ok(())
}
