use kasa_serena_backend::api::{self, AppState};
use kasa_serena_backend::config::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().flatten_event(true))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    dotenv::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Startup aborted: {}", e);
            std::process::exit(1);
        }
    };

    let state = match AppState::from_config(&config).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Startup aborted: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = api::start_http_server(state, config.port).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
