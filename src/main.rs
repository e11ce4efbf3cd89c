use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flashdeck::{config::AppConfig, db, handlers, state::AppState};

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "flashdeck=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = AppConfig::load();

  let pool = db::init_db(&config.database.path).expect("Failed to initialize database");
  tracing::info!("Using database at {}", config.database.path.display());

  let app = handlers::router(AppState::new(pool, &config));

  let bind_addr = config.bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://{}", bind_addr);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
