use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod repository;
mod routes;
mod service;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::utils::image_upload::ImageUploader;
use crate::utils::schedule_cache;
use tracing::{Level, error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let level = config.log_level.parse::<Level>().unwrap_or(Level::DEBUG);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let uploader = ImageUploader::new(
        config.image_upload_url.clone(),
        config.image_upload_preset.clone(),
        config.image_upload_timeout,
    )?;
    if !uploader.is_enabled() {
        warn!("IMAGE_UPLOAD_URL not set, attendance photos will not be stored");
    }

    let pool_for_cache_warmup = pool.clone();
    let default_schedule = config.default_schedule;
    actix_web::rt::spawn(async move {
        if let Err(e) =
            schedule_cache::warmup_schedule_cache(&pool_for_cache_warmup, default_schedule).await
        {
            error!(error = %e, "Failed to warm up schedule cache");
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(uploader.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
