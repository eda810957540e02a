use image_converter_rs::{
    app::{self, App},
    types::Config,
};
use tracing_subscriber::prelude::*;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::from_env().map_err(|err| {
        tracing::error!("Invalid configuration: {}", err);
        err
    })?;

    let server = App::new(config).bind().await?;
    server.run(app::shutdown_signal()).await?;

    Ok(())
}
