//! NetworkFilesystem endpoint controller
//!
//! Main entry point. Parses configuration, sets up the Kubernetes client,
//! and runs the endpoint controller next to the metrics server.

use clap::Parser;
use kube::Client;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use networkfs_endpoint_controller::{
    config::Config,
    controllers::{endpoint_controller, Context},
    metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    init_tracing(config.log_json);
    config.validate()?;

    info!(
        namespace = %config.namespace,
        node = config.node_name.as_deref().unwrap_or_default(),
        "Starting NetworkFilesystem endpoint controller"
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    let context = Context::new(client, &config);

    let metrics_handle = tokio::spawn(metrics::serve(config.metrics_port));
    info!("Metrics server starting on port {}", config.metrics_port);

    let controller_handle = tokio::spawn(endpoint_controller::run(context));

    tokio::select! {
        _ = controller_handle => {
            error!("Endpoint controller exited unexpectedly");
        }
        res = metrics_handle => {
            error!("Metrics server exited unexpectedly: {:?}", res);
        }
        res = shutdown_signal() => {
            res?;
            info!("Received shutdown signal, stopping controller");
        }
    }

    info!("NetworkFilesystem endpoint controller stopped");
    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,networkfs_endpoint_controller=debug,kube=warn,hyper=warn")
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            res = signal::ctrl_c() => {
                res?;
                info!("Received CTRL+C signal");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM signal");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received CTRL+C signal");
    }

    Ok(())
}
