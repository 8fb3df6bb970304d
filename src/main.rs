use backend_k8_rs::{
    app::App,
    types::{Config, StartupFailure},
    utils::{config::LogFormat, logging::init_tracing},
};
use std::process::ExitCode;

async fn run(config: Result<Config, StartupFailure>) -> Result<(), StartupFailure> {
    App::new(config?).await?.serve().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();

    init_tracing(
        config
            .as_ref()
            .map(|config| config.app.log_format)
            .unwrap_or(LogFormat::Pretty),
    );

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Startup failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
