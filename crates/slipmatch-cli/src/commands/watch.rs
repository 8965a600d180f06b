use slipmatch_core::config::Config;
use slipmatch_core::error::SlipmatchError;
use slipmatch_core::extraction::pdftoppm::PdftoppmRasterizer;
use slipmatch_core::extraction::tesseract::TesseractRecognizer;
use slipmatch_core::pipeline::Pipeline;
use slipmatch_core::service::{ShutdownHandle, WatchService};

use crate::output::json::JsonLinesSink;
use crate::output::table::TableSink;

pub fn run(config: &Config, output_format: &str) -> Result<(), SlipmatchError> {
    if !PdftoppmRasterizer::with_binary(&config.tools.pdftoppm).is_available() {
        return Err(SlipmatchError::RasterizerNotFound);
    }
    let recognizer =
        TesseractRecognizer::with_options(&config.tools.tesseract, &config.tools.ocr_language);
    if !recognizer.is_available() {
        return Err(SlipmatchError::RecognizerNotFound);
    }

    let pipeline = Pipeline::from_config(config);
    let service = WatchService::new();
    spawn_signal_listener(service.shutdown_handle())?;

    match output_format {
        "json" => service.run(config, &pipeline, &mut JsonLinesSink),
        _ => service.run(config, &pipeline, &mut TableSink::default()),
    }
}

/// Stop the service on Ctrl+C or SIGTERM. A running job finishes first.
fn spawn_signal_listener(handle: ShutdownHandle) -> Result<(), SlipmatchError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::spawn(move || {
        runtime.block_on(shutdown_signal());
        handle.shutdown();
    });
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
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
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C; closing all threads once queued arrivals are handled");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM; closing all threads once queued arrivals are handled");
        }
    }
}
