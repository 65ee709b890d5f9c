//! `qdesk-agent` -- print agent for queue tickets.
//!
//! Runs next to a thermal printer, picks up print jobs from the qdesk
//! server and prints them. Several agents may share one server; each job
//! is printed by whichever agent claims it first.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default     | Description                                  |
//! |------------------------|----------|-------------|----------------------------------------------|
//! | `SERVER_URL`           | yes      | --          | Base URL of the server, e.g. `http://host:8080` |
//! | `AGENT_ID`             | no       | `printer-1` | Identity used when claiming jobs             |
//! | `PRINTER_NAME`         | no       | `ECO80`     | Printer name shown in logs                   |
//! | `PRINTER_DEVICE`       | no       | --          | Raw device path; unset prints to the log     |
//! | `RETRY_DELAY_SECS`     | no       | `5`         | Wait before reconnecting a lost stream       |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`        | Timeout for claim/complete/fail requests     |

use std::sync::Arc;

use qdesk_agent::client::HttpDispatchClient;
use qdesk_agent::config::AgentConfig;
use qdesk_agent::printer::{DevicePrinter, DryRunPrinter, TicketPrinter};
use qdesk_agent::runtime::AgentRuntime;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qdesk_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        agent_id = %config.agent_id,
        server_url = %config.server_url,
        printer = %config.printer_name,
        device = config.printer_device.as_ref().map(|p| p.display().to_string()),
        "Starting qdesk-agent",
    );

    let client = HttpDispatchClient::new(&config.server_url, &config.agent_id, config.request_timeout)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build HTTP client");
            std::process::exit(1);
        });

    let printer: Arc<dyn TicketPrinter> = match &config.printer_device {
        Some(device) => Arc::new(DevicePrinter::new(&config.printer_name, device)),
        None => {
            tracing::warn!("PRINTER_DEVICE not set, tickets will only be logged");
            Arc::new(DryRunPrinter::new(&config.printer_name))
        }
    };

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    AgentRuntime::new(Arc::new(client), printer, config.retry_delay)
        .run(cancel)
        .await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), stopping"),
        () = terminate => tracing::info!("Received SIGTERM, stopping"),
    }
}
