//! Batch runner entry point.

use std::process::ExitCode;

use clap::Parser;
use fulfill::{Args, Config};
use saga::CancellationToken;
use tokio::signal;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, canceling in-flight sagas");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, canceling in-flight sagas");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // 1. Load configuration
    let mut config = Config::from_env();
    args.apply(&mut config);

    // 2. Initialize tracing
    if let Err(err) = fulfill::telemetry::init_tracing(&config) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    // 3. Install Prometheus metrics recorder
    let metrics_handle = match fulfill::telemetry::install_metrics() {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "metrics unavailable");
            return ExitCode::FAILURE;
        }
    };

    // 4. Cancel the batch on shutdown
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    // 5. Run the batch
    let report = match fulfill::run(&args, &config, &cancel).await {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(error = %err, "batch aborted");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                tracing::error!(error = %fulfill::CliError::from(err), "report unavailable");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{report}");
    }

    if args.print_metrics {
        println!("{}", metrics_handle.render());
    }

    ExitCode::SUCCESS
}
