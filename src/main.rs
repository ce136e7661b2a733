use std::{env, sync::Arc};

use actix_cors::Cors;
use actix_web::{http::header, middleware::NormalizePath, web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use memory_diary::{
    ai::GeminiClient,
    auth::password::hash_password,
    background_task::{start_maintenance_task, MAINTENANCE_INTERVAL},
    db::postgres::{create_pool, run_migrations},
    graceful_shutdown::shutdown_signal,
    middlewares::auth::SessionMiddleware,
    repositories::sqlx_repo::SqlxEventRepo,
    routes::{configure_routes, json_config},
    settings::{AppConfig, AppEnvironment},
    storage::filesystem::FilesystemObjectStorage,
    AppState,
};

fn init_tracing(production: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("memory_diary=info,actix_web=info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if production {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if origins.iter().any(|origin| origin == "*") {
        cors.allow_any_origin()
    } else {
        origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

/// `hash-password <password>` prints the PHC string for `APP_ACCESS_PASSWORD_HASH`.
fn run_hash_password(args: &[String]) -> std::io::Result<()> {
    let Some(password) = args.get(2) else {
        eprintln!("usage: memory_diary hash-password <password>");
        std::process::exit(2);
    };
    let hash = hash_password(password)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    println!("{}", hash);
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-password") {
        return run_hash_password(&args);
    }

    let production = env::var("APP_ENV")
        .map(|value| value.eq_ignore_ascii_case(&AppEnvironment::Production.to_string()))
        .unwrap_or(false);
    init_tracing(production);

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        },
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = create_pool(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create database connection pool: {}", e);
            std::io::Error::other(e)
        })?;

    run_migrations(&pool).await.map_err(|e| {
        tracing::error!("Failed to apply migrations: {}", e);
        std::io::Error::other(e)
    })?;

    let storage = FilesystemObjectStorage::new(
        config.storage_root.clone(),
        &config.public_base_url,
        config.max_upload_bytes,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to prepare object storage: {}", e);
        std::io::Error::other(e)
    })?;

    let ai_service = GeminiClient::new(&config).map_err(|e| {
        tracing::error!("Failed to build AI client: {}", e);
        std::io::Error::other(e)
    })?;
    if config.ai_api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY not set, AI features will fail");
    }

    let app_state = web::Data::new(AppState::new(
        &config,
        Arc::new(SqlxEventRepo::new(pool)),
        Arc::new(storage),
        Arc::new(ai_service),
    ));

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "🚀 Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    tokio::spawn(start_maintenance_task(
        app_state.view_cache.clone(),
        app_state.rate_limiter.clone(),
        MAINTENANCE_INTERVAL,
    ));

    let cors_origins = config.cors_origins();
    let max_upload_bytes = config.max_upload_bytes;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(json_config(max_upload_bytes))
            .wrap(SessionMiddleware)
            .wrap(NormalizePath::trim())
            .wrap(build_cors(&cors_origins))
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
