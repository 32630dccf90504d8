//! List Generator server - upload a menu spreadsheet, get list models back.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use list_generator::{
    sheet_parser, Dataset, GeneratorConfig, GeneratorError, ListGenerator, ListModel,
    RenderedListModel, TemplateError, TemplateStore,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    generator: Arc<ListGenerator>,
    templates: Arc<TemplateStore>,
    config: Arc<GeneratorConfig>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "list_generator=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GeneratorConfig::from_env()?;
    let generator = ListGenerator::new(&config)?;

    let templates = TemplateStore::load_from_dir(&config.template_dir)?;
    info!("Loaded {} templates: {:?}", templates.list().len(), templates.list());

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        generator: Arc::new(generator),
        templates: Arc::new(templates),
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/templates", get(list_templates))
        .route("/model", post(create_model))
        .route("/generate", post(generate))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

async fn list_templates(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.templates.list())
}

/// Upload a spreadsheet and return the unrendered list model.
async fn create_model(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ListModel>, (StatusCode, String)> {
    let dataset = read_dataset(multipart).await?;
    state
        .generator
        .create(&dataset)
        .map(Json)
        .map_err(error_response)
}

#[derive(serde::Deserialize)]
struct GenerateQuery {
    template: Option<String>,
}

/// Upload a spreadsheet and render it with a template.
async fn generate(
    State(state): State<AppState>,
    Query(query): Query<GenerateQuery>,
    multipart: Multipart,
) -> Result<Json<RenderedListModel>, (StatusCode, String)> {
    let template = query
        .template
        .unwrap_or_else(|| state.config.default_template.clone());
    let dataset = read_dataset(multipart).await?;

    let rendered = state
        .generator
        .generate(&dataset, state.templates.as_ref(), &template)
        .map_err(error_response)?;

    info!(
        "Generated '{}' from {} ({} rows)",
        template,
        dataset.name,
        dataset.len()
    );
    Ok(Json(rendered))
}

// ============================================================================
// Helper functions
// ============================================================================

/// Read the `file` field of a multipart upload and parse it.
async fn read_dataset(mut multipart: Multipart) -> Result<Dataset, (StatusCode, String)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e))
    })? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.csv").to_string();
            let data = field.bytes().await.map_err(|e| {
                (StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e))
            })?;
            info!("Received file: {} ({} bytes)", filename, data.len());
            return sheet_parser::parse_file(&filename, &data).map_err(error_response);
        }
    }

    Err(error_response(GeneratorError::missing(
        list_generator::Stage::Load,
        "file",
    )))
}

fn error_response(err: GeneratorError) -> (StatusCode, String) {
    let status = match &err {
        GeneratorError::MissingArgument { .. }
        | GeneratorError::MalformedInput(_)
        | GeneratorError::LevelPattern { .. } => StatusCode::BAD_REQUEST,
        GeneratorError::Template(TemplateError::NotFound(_)) => StatusCode::NOT_FOUND,
        GeneratorError::Template(_) | GeneratorError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error!("{} stage failed: {}", err.stage(), err);
    (status, err.to_string())
}
