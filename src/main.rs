mod auth;
mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use actix_web::{App, HttpServer, web};
use tracing_subscriber::EnvFilter;

use crate::auth::{AuthService, SeaOrmAdapter};
use crate::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| std::io::Error::other(e.to_string()))?;

    tracing::info!("connecting to database");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to connect to database: {}", e)))?;
    tracing::info!("database connected");

    if config.auto_migrate {
        db::create_schema(&db)
            .await
            .map_err(|e| std::io::Error::other(format!("Failed to create schema: {}", e)))?;
    }

    let auth = web::Data::new(AuthService::new(SeaOrmAdapter::new(db.clone()), config.auth.clone()));
    let db = web::Data::new(db);

    tracing::info!(host = %config.host, port = config.port, "starting server");

    HttpServer::new(move || {
        App::new()
            .app_data(db.clone())
            .app_data(auth.clone())
            .configure(routes::configure_routes)
    })
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
