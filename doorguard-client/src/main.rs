use std::env;
use std::sync::Arc;

use doorguard_client::cli::Invocation;
use doorguard_client::configs::Settings;
use doorguard_client::run;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let settings = Arc::new(Settings::new().expect("Failed to load settings."));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.logger.level.as_str();

            format!("{app_name}={level}").into()
        }))
        .init();

    if let Err(e) = run(&settings, Invocation::parse(env::args())).await {
        tracing::error!("{}", e);
    }
}
