use actix_cors::Cors;
use actix_web::{App, HttpServer, http, middleware::NormalizePath, web};
use tokio::time::Duration;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use portfolio_contact_api::{
    AppState, background_task::start_rate_limit_sweep, email::resend::ResendMailer,
    graceful_shutdown::shutdown_signal, routes::configure_routes, settings::AppConfig,
};

const SWEEP_INTERVAL_SECS: u64 = 60;

fn cors_for(config: &AppConfig) -> Cors {
    if config.is_production() {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::ACCEPT])
            .max_age(3600);
        for origin in config.cors_origins() {
            cors = cors.allowed_origin(&origin);
        }
        cors
    } else {
        Cors::permissive()
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Loaded configuration: {:?}", config);

    let report = config.email_report();
    if !report.is_valid {
        tracing::warn!(
            "email configuration incomplete, submissions will be refused: {}",
            report.issues.join("; ")
        );
    }
    for warning in &report.warnings {
        tracing::warn!("email configuration: {}", warning);
    }

    let app_state = match AppState::new(&config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            tracing::error!("Failed to initialise application state: {}", e);
            std::process::exit(1);
        }
    };

    let limiter = app_state.contact_gateway.limiter().clone();
    tokio::spawn(start_rate_limit_sweep(
        limiter,
        Duration::from_secs(SWEEP_INTERVAL_SECS),
    ));

    let server_addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        "Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let worker_count = config.worker_count;
    let server_config = config.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .wrap(cors_for(&server_config))
            .configure(configure_routes::<ResendMailer>)
    })
    .workers(worker_count)
    .bind(server_addr)?
    .run();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
