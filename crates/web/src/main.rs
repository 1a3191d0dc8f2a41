use anyhow::Context;
use axum::Router;
use storage::Database;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod state;

use config::Config;
use features::{ranking, series};
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        series::handlers::get_series_standings,
        series::handlers::get_club_standings,
        series::handlers::rebuild_club_standings,
        ranking::handlers::get_ranking,
    ),
    components(
        schemas(
            storage::dto::standings::SeriesStandingsFilter,
            storage::dto::standings::SeriesStandingRow,
            storage::dto::standings::ClassStandings,
            storage::dto::standings::ClubContribution,
            storage::dto::standings::ClubStandingRow,
            storage::dto::standings::RankedRider,
            storage::dto::standings::CacheRun,
            storage::dto::common::PaginationMeta,
            storage::dto::ranking::SubjectKind,
            storage::dto::ranking::RankingSubject,
            storage::dto::ranking::RankingBreakdownEntry,
            storage::dto::ranking::RankingRecord,
            storage::dto::ranking::RankingPage,
            storage::models::Discipline,
            storage::models::RankingParameters,
            storage::models::FieldSizeBreakpoint,
        )
    ),
    tags(
        (name = "series", description = "Series and club standings"),
        (name = "rankings", description = "Weighted 24-month rankings"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting standings API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!(
        "Configuration loaded (ranking window {} months, minimum public group size {})",
        config.ranking_parameters.window_months,
        config.min_public_group_size
    );

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("No API_KEYS configured, cache rebuild endpoint will reject every request");
    }

    let state = AppState::new(db, &config);

    let app = Router::new()
        .nest("/api/series", series::routes::routes(api_keys))
        .nest("/api/rankings", ranking::routes::routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state);

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
