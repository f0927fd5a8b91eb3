use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flashdeck::{config::AppConfig, db, dispatch, handlers, state::AppState};

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
  tracing::info!("Using database at {}", config.database_path.display());

  let pool = db::init_db(&config.database_path).expect("Failed to initialize database");
  let bind_addr = config.bind_addr();
  let dispatch_interval = config.dispatch_interval;

  let state = AppState::new(pool, config);
  tokio::spawn(dispatch::run_dispatcher(state.clone(), dispatch_interval));

  let app = handlers::router(state);

  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://{}", bind_addr);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
