use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tablecast::engine::Tuning;
use tablecast::{config, record, state};

fn init_tracing() {
    let subscriber = tracing_subscriber::fmt().with_target(false).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    tracing::info!(
        config_path = config::DEFAULT_CONFIG_PATH,
        "tablecast starting"
    );
    let config = config::load_default()?;

    // Load tuning tables
    let tuning = match config.tuning_path() {
        Some(path) => match Tuning::load_from_path(path) {
            Ok(tuning) => {
                tracing::info!(path = %path.display(), version = %tuning.version.0, "Tuning loaded");
                tuning
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load tuning, using defaults");
                Tuning::default()
            }
        },
        None => {
            tracing::info!("No tuning path configured, using defaults");
            Tuning::default()
        }
    };

    let mut app_state = state::AppState::new(tuning);
    app_state.set_report_extremes(config.report_extremes());

    // Load population and build calibration tables before serving
    match config.population_path() {
        Some(path) => match record::load_from_path(path) {
            Ok(population) => {
                tracing::info!(
                    path = %path.display(),
                    records = population.len(),
                    version = population.version(),
                    "Population loaded, calibration built"
                );
                app_state.set_population(population);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load population, starting degraded");
            }
        },
        None => {
            tracing::warn!("No population path configured, starting degraded");
        }
    }

    let state = Arc::new(RwLock::new(app_state));
    let app = tablecast::api::router(Arc::clone(&state));
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
