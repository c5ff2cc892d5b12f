mod args;
mod server;

use anyhow::{Context, Result};
use args::Cli;
use arp_exporter_runtime::io::{
    self, CaptureConfig, CaptureError, FrameSource, LiveCapture, PcapFile,
};
use arp_exporter_runtime::session::MonitorSession;
use arp_exporter_runtime::utils::runner::build_runtime;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let runtime = build_runtime().context("error building runtime")?;
    let result = runtime.block_on(run(cli));
    if let Err(err) = &result {
        error!("{:#}", err);
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let node = io::hostname().context("error getting hostname")?;
    let session = Arc::new(
        MonitorSession::new(node, cli.monitor_config()).context("error creating metrics")?,
    );
    let cancel = CancellationToken::new();

    let monitor = match &cli.read_file {
        Some(path) => {
            let file = PcapFile::open(path, cli.replay_mode())?;
            spawn_monitor(Arc::clone(&session), file, cancel.clone())
        }
        None => {
            let hardware_addr = io::hardware_addr(&cli.interface)
                .with_context(|| format!("error getting interface {}", cli.interface))?;
            let capture = LiveCapture::open(&cli.interface, &CaptureConfig::default())?;
            session.attach_injector(capture.handle(), hardware_addr);
            spawn_monitor(Arc::clone(&session), capture, cancel.clone())
        }
    };

    let sweeper = {
        let session = Arc::clone(&session);
        let cancel = cancel.clone();
        tokio::spawn(async move { session.run_sweeper(cancel).await })
    };

    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("error listening on {}", cli.listen))?;
    let grace = cli.shutdown_grace();
    let server = {
        let session = Arc::clone(&session);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let result = server::serve(listener, session, cancel.clone(), grace).await;
            if let Err(err) = &result {
                error!(error = %err, "HTTP server failed");
                cancel.cancel();
            }
            result
        })
    };

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("error waiting for interrupt")?;
            info!("interrupt received, shutting down");
            cancel.cancel();
        }
        _ = cancel.cancelled() => warn!("shutting down after a fatal error"),
    }

    match tokio::time::timeout(grace, async { tokio::join!(monitor, sweeper, server) }).await {
        Ok((monitor, sweeper, server)) => {
            sweeper.context("sweep task panicked")?;
            server
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
            monitor
                .context("monitor task panicked")?
                .context("ARP monitoring failed")?;
        }
        Err(_) => warn!(?grace, "tasks did not stop within the grace period"),
    }

    info!("shutdown complete");
    Ok(())
}

/// Runs the processing loop over `source` on its own task. A failing source cancels everything
/// else.
fn spawn_monitor<S: FrameSource + 'static>(
    session: Arc<MonitorSession>,
    mut source: S,
    cancel: CancellationToken,
) -> JoinHandle<Result<(), CaptureError>> {
    tokio::spawn(async move {
        let result = session.run_monitor(&mut source, &cancel).await;
        if let Err(err) = &result {
            error!(error = %err, "ARP monitoring failed");
            cancel.cancel();
        }
        result
    })
}
