use mailchimp_members::configuration::get_configuration;
use mailchimp_members::startup::Application;
use mailchimp_members::telemetry::get_subscriber;
use mailchimp_members::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // RUST_LOG overrides the default level
    let subscriber = get_subscriber("mailchimp-members", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cfg = get_configuration()?;

    let app = Application::build(cfg).await?;
    tracing::info!("listening on port {}", app.port());
    app.run_until_stopped().await?;
    Ok(())
}
