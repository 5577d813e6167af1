use std::{error::Error, sync::Arc};

use axum::http::{
    header::{CONTENT_TYPE, COOKIE},
    HeaderValue, Method,
};
use tokio::{fs, net, task};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter,
};

use brigade::{
    config,
    db::{self, seed, Store},
    http::{self, AppState},
    wtt, Config,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fs::read_to_string("config.toml").await?;
    let config = toml::from_str::<Config>(&config)?;

    let store: Arc<dyn Store> = match &config.db {
        config::Db::Postgres { url } => {
            let (db_client, db_connection) = db::connect(url).await?;

            task::spawn(async move {
                if let Err(e) = db_connection.await {
                    panic!("database connection failed: {e}");
                }
            });

            Arc::new(db_client)
        }
        config::Db::Memory => {
            info!("using volatile in-memory storage");
            Arc::new(db::Memory::new())
        }
    };

    let clock = wtt::Clock::new(config.clock).map_err(|e| {
        error!(%e, "invalid clock.utc_offset_hours");
        e
    })?;

    seed::run(&*store, config.bootstrap.as_ref()).await?;

    let origins = config
        .http
        .cors
        .allowed_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, COOKIE])
        .allow_credentials(true)
        .allow_origin(origins);

    let app = http::router(Arc::new(AppState {
        store,
        session: config.session,
        clock,
    }))
    .layer(cors)
    .layer(TraceLayer::new_for_http());

    let listener = net::TcpListener::bind(config.http.server.addr).await?;
    info!(addr = %config.http.server.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
