use anyhow::Context;
use library_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load library settings")?;

    library_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "library-app bootstrap starting"
    );

    library_app::run(settings, library_app::utils::shutdown_signal()).await?;

    tracing::info!("library-app shut down cleanly");
    Ok(())
}
