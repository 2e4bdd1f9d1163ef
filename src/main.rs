use clap::Parser;
use homeprice_api::{InMemoryOrderRepository, OrderService, PricingService, RestApi};
use homeprice_core::{Estimator, EstimatorConfig, DEFAULT_K};
use homeprice_storage::{DatasetStore, LoadMode, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Nearest-neighbor house price estimation service
#[derive(Parser, Debug)]
#[command(name = "homeprice")]
#[command(about = "Estimate house prices from comparable listings", long_about = None)]
struct Args {
    /// Path to the comparable dataset (CSV)
    #[arg(short, long, default_value = "./dataset/datasetprice.csv")]
    dataset: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 3000)]
    http_port: u16,

    /// Number of comparables used per estimate
    #[arg(short, long, default_value_t = DEFAULT_K)]
    k: usize,

    /// Dataset load mode: "cached" or "per-request"
    #[arg(long, default_value = "cached")]
    load_mode: String,

    /// Reload the cached dataset every N seconds (0 disables)
    #[arg(long, default_value_t = 0)]
    refresh_interval_secs: u64,

    /// Timeout for a per-request dataset load, in milliseconds
    #[arg(long, default_value_t = 5000)]
    load_timeout_ms: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.k == 0 {
        anyhow::bail!("--k must be at least 1");
    }

    info!("Starting homeprice v{}", env!("CARGO_PKG_VERSION"));
    info!("Dataset: {:?}", args.dataset);
    info!("HTTP API port: {}", args.http_port);

    let config = StoreConfig {
        dataset_path: args.dataset.clone(),
        load_mode: args.load_mode.parse::<LoadMode>()?,
        refresh_interval: (args.refresh_interval_secs > 0)
            .then(|| Duration::from_secs(args.refresh_interval_secs)),
        load_timeout: Duration::from_millis(args.load_timeout_ms),
    };
    info!("Load mode: {:?}", config.load_mode);

    let store = Arc::new(DatasetStore::new(config)?);
    let estimator = Estimator::new(EstimatorConfig { k: args.k });
    let pricing = Arc::new(PricingService::new(store, estimator));
    let orders = Arc::new(OrderService::new(
        pricing.clone(),
        Arc::new(InMemoryOrderRepository::new()),
    ));
    info!("Estimator ready (k = {})", args.k);

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(pricing, orders, http_port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
