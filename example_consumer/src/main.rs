//! Example consumer: two controllers sharing one generic declaration, backed by PostgreSQL when
//! `DATABASE_URL` is set and by the in-memory store otherwise.
//!
//! Run from repo root: `cargo run -p example-consumer`

use architect_crud::{
    common_routes, common_routes_with_ready, connect, openapi_routes, ControllerConfig, GenericCrudController,
    InMemoryStore, Model, PgStore, RepositoryProvider, ServerSettings,
};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
struct Author {
    #[serde(default)]
    id: Option<i64>,
    full_name: String,
    #[serde(default)]
    born_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
struct Book {
    #[serde(default)]
    id: Option<i64>,
    title: String,
    author_id: i64,
}

/// Build one controller and merge its routes and schema into the app.
fn mount<T, P>(
    app: Router,
    docs: &mut Option<utoipa::openapi::OpenApi>,
    config: ControllerConfig,
    provider: P,
) -> Result<Router, Box<dyn std::error::Error>>
where
    T: Model,
    P: RepositoryProvider<T>,
{
    let controller = GenericCrudController::<T, P>::new(config, provider)?;
    let doc = controller.openapi()?;
    if let Some(existing) = docs.as_mut() {
        existing.merge(doc);
    } else {
        *docs = Some(doc);
    }
    Ok(app.merge(controller.router()?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("architect_crud=info")),
        )
        .init();

    let settings = ServerSettings::from_env()?;
    // shared declaration; each controller binds its own model type
    let base = ControllerConfig::new("/")
        .generic_model("T")
        .body_limit(settings.body_limit);

    let mut docs = None;
    let mut app = Router::new();
    match &settings.database_url {
        Some(url) => {
            let pool = connect(url, 5).await?;
            let authors = PgStore::<Author>::new(pool.clone(), "authors")?;
            let books = PgStore::<Book>::new(pool.clone(), "books")?;
            authors.ensure_table().await?;
            books.ensure_table().await?;
            let authors_config = base.clone().path("/api/v1/authors").model_type::<Author>();
            app = mount::<Author, _>(app, &mut docs, authors_config, authors)?;
            app = mount::<Book, _>(app, &mut docs, base.path("/api/v1/books").model_type::<Book>(), books)?;
            app = app.merge(common_routes_with_ready(pool));
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory store");
            app = mount::<Author, _>(
                app,
                &mut docs,
                base.clone().path("/api/v1/authors").model_type::<Author>(),
                InMemoryStore::<Author>::new(),
            )?;
            app = mount::<Book, _>(
                app,
                &mut docs,
                base.path("/api/v1/books").model_type::<Book>(),
                InMemoryStore::<Book>::new(),
            )?;
            app = app.merge(common_routes());
        }
    }
    if let Some(doc) = docs {
        app = app.merge(openapi_routes(doc));
    }

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
