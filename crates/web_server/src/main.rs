//! Main entry point for the users service.
//! Wires configuration, storage, signing keys and the message queue into the HTTP server.

mod config;

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use auth_services::jwt::JwtService;
use auth_services::keys::JwtKeyMaterial;
use auth_services::pg_store::PgUserStore;
use auth_services::service::AuthService;
use notification_services::rabbitmq::DEFAULT_RETRY_INTERVAL;
use notification_services::{NotificationService, RabbitMqPublisher};
use postgres::database::*;
use web_handlers::errors::not_found;
use web_handlers::routes;

use crate::config::ServerConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting users service...");

    let pool = create_connection_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;
    log::info!("🗃️ Database pool created successfully");

    if let Err(e) = test_connection(&pool).await {
        log::error!("❌ Database connection test failed: {}", e);
    }
    run_migrations(&pool)
        .await
        .context("Failed to apply database migrations")?;

    let keys = JwtKeyMaterial::from_pem_files(
        &config.jwt_private_key_path,
        &config.jwt_public_key_path,
    )
    .with_context(|| {
        format!(
            "Failed to load JWT keys from {} and {} (run gen-keys to create them)",
            config.jwt_private_key_path.display(),
            config.jwt_public_key_path.display()
        )
    })?;
    log::info!("🔑 Loaded JWT signing key, kid {}", keys.kid());

    let jwt_service = JwtService::new(keys, config.jwt.clone());
    let auth_service = AuthService::new(Arc::new(PgUserStore::new(pool)));

    if let Some(admin) = &config.admin {
        auth_service
            .ensure_admin(&admin.name, &admin.email, &admin.password)
            .await
            .context("Failed to provision the admin account")?;
    }

    let publisher = Arc::new(
        RabbitMqPublisher::new(config.rabbitmq_url.clone())
            .with_retry(config.rabbitmq_connect_attempts, DEFAULT_RETRY_INTERVAL),
    );
    let notification_service = NotificationService::new(publisher.clone());

    // Connect in the background; publishes fail fast until this first connect finishes.
    tokio::spawn(async move {
        if let Err(e) = publisher.connect().await {
            log::error!("❌ RabbitMQ unavailable at startup: {}", e);
        }
    });

    let bind_address = (config.host.clone(), config.port);
    log::info!("🌐 Server will be available at: http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let jwt_service = jwt_service.clone();

        App::new()
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(notification_service.clone()))
            .wrap(Logger::default())
            .configure(|cfg| routes::configure(cfg, jwt_service))
            .default_service(web::route().to(not_found))
    })
    .shutdown_timeout(10)
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
