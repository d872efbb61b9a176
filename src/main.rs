use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;
use std::time::Instant;

use storefront::catalog::{MockCatalog, ProductSource};
use storefront::config::AppConfig;
use storefront::gateway::{self, AppState};
use storefront::rate_limit::FixedWindowLimiter;
use storefront::db;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let catalog: Arc<dyn ProductSource> = match &config.database_url {
        Some(url) => {
            let database = db::connect(url, &config.database_name)
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            log::info!("Serving products from database {}", config.database_name);
            Arc::new(db::MongoCatalog::new(&database))
        }
        None => {
            log::info!("DATABASE_URL not set, serving the demo catalog");
            Arc::new(MockCatalog::demo())
        }
    };

    let state = web::Data::new(AppState {
        catalog,
        limits: config.page_limits,
    });
    let limiter = FixedWindowLimiter::new(config.rate_limit_max, config.rate_limit_window);

    // expired counters would otherwise accumulate for every client ever seen
    let sweeper = limiter.clone();
    let sweep_every = config.rate_limit_sweep;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let removed = sweeper.sweep_expired(Instant::now());
            if removed > 0 {
                log::debug!("Swept {} expired rate limit counters", removed);
            }
        }
    });

    let address = config.bind_address();
    log::info!("Listening on {}", address);

    HttpServer::new(move || {
        let limiter = limiter.clone();
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(|cfg| gateway::configure(cfg, limiter))
    })
    .bind(address)?
    .run()
    .await
}
