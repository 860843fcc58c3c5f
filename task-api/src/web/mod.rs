use axum::Router;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{self, Config};
use crate::task::api::v1::TaskState;
use crate::task::repository::DatabaseTaskRepository;
use crate::task::{TaskService, seed};

pub mod api;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<DatabaseConnection>,
}

impl AppState {
    /// Builds the task service on top of the shared database connection.
    pub fn task_service(&self) -> TaskService {
        TaskService::new(Arc::new(DatabaseTaskRepository::new(self.db.clone())))
    }
}

/// Builds the complete application router: JSON API, OpenAPI document and Swagger UI.
pub fn create_app(task_service: TaskService) -> Router {
    let task_state = Arc::new(TaskState {
        service: task_service,
    });

    Router::new()
        .merge(api::create_api_router(task_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: config::Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let state = AppState {
        config: Arc::new(config),
        db: Arc::new(db),
    };
    let task_service = state.task_service();

    if state.config.seed_sample_data {
        let created = seed::seed_sample_tasks(&task_service).await?;
        tracing::info!("Seeded {} sample tasks", created);
    }

    let app = create_app(task_service);

    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    axum::serve(listener, app).await?;
    Ok(())
}
