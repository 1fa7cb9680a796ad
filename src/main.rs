use std::net::SocketAddr;
use std::sync::Arc;

use stock_clock::config::Config;
use stock_clock::db::{create_pool, DocumentStore, MemoryDocumentStore, PgDocumentStore};
use stock_clock::models::{ClockInModel, ItemModel};
use stock_clock::proto::clock_in::clock_in_service_server::ClockInServiceServer;
use stock_clock::proto::items::items_service_server::ItemsServiceServer;
use stock_clock::proto::FILE_DESCRIPTOR_SET;
use stock_clock::repository::Entity;
use stock_clock::services::{ClockInServiceImpl, ItemsServiceImpl};

use tonic::transport::Server;
use tonic_reflection::server::Builder as ReflectionBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stock_clock=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Starting stock-clock gRPC server...");

    // One store handle shared by every service
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = create_pool(url, config.db_max_connections).await?;
            let store = PgDocumentStore::new(pool);
            store.ensure_collection(ItemModel::COLLECTION).await?;
            store.ensure_collection(ClockInModel::COLLECTION).await?;
            tracing::info!("Database connection established");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, records are kept in memory only");
            Arc::new(MemoryDocumentStore::new())
        }
    };
    tracing::info!("Document store backend: {}", store.backend());

    let items_service = ItemsServiceImpl::new(store.clone());
    let clock_in_service = ClockInServiceImpl::new(store.clone());

    // Build reflection service
    let reflection_service = ReflectionBuilder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    // CORS layer for gRPC-Web
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
        .expose_headers(Any);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!("Listening on {}", addr);

    Server::builder()
        .accept_http1(true) // Required for gRPC-Web
        .layer(TraceLayer::new_for_grpc())
        .layer(cors)
        .layer(tonic_web::GrpcWebLayer::new())
        .add_service(reflection_service)
        .add_service(ItemsServiceServer::new(items_service))
        .add_service(ClockInServiceServer::new(clock_in_service))
        .serve(addr)
        .await?;

    Ok(())
}
