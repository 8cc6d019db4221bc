use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use kodit::app::register_default_handlers;
use kodit::application::config::configuration::Configuration;
use kodit::application::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = Configuration::parse();

    Application::install_logging(&configuration);
    let application = Application::initialize(configuration).await?;
    info!("kodit starting up");

    register_default_handlers(&application).await?;

    let cancellation = CancellationToken::new();
    let worker_count = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);

    let dispatcher = application.dispatcher.clone();
    let worker_handle = tokio::spawn(
        dispatcher.run_workers(application.clone(), worker_count, cancellation.clone()),
    );

    let webserver = tokio::spawn(kodit::webserver::serve(application));

    tokio::select! {
        result = webserver => {
            if let Ok(Err(err)) = result {
                error!(%err, "webserver exited with an error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    cancellation.cancel();
    let _ = worker_handle.await;

    Ok(())
}
