use std::io::IsTerminal;
use std::sync::Arc;

use hn_stream::config::AppConfig;
use hn_stream::providers::openai::OpenAiClient;
use hn_stream::render::TerminalRenderer;
use hn_stream::session::Session;
use hn_stream::telemetry;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = telemetry::init_from_env()?;

    let config = AppConfig::from_env()?;
    let client = Arc::new(OpenAiClient::from_config(config.openai_config())?);
    tracing::info!(?client, "client ready");

    let session = Session::new(client, config.session_options());
    let mut renderer = TerminalRenderer::stdout().with_clear_screen(std::io::stdout().is_terminal());

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let report = session.run_until_cancelled(&mut renderer, shutdown).await;
    for (slot, error) in &report.failures {
        eprintln!("{slot}: {error}");
    }
    Ok(())
}
