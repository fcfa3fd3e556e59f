use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::BoxMakeWriter;

use comfyui_tools::{api, logging, ComfyUIClient, Config, TemplateStore, ToolContext};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    Config::dotenv_load();
    let config = Config::new();

    // Initialize tracing
    logging::init("info", BoxMakeWriter::new(std::io::stdout), config.log_dir.as_deref())?;
    config.print_env_vars();

    let templates = TemplateStore::load(&config.templates_dir).await?;
    let client = Arc::new(ComfyUIClient::new(config.comfyui_url.clone()));
    let tools = ToolContext::new(&config, client, templates);
    let app = api::router(api::AppState::new(tools));

    // Run our application with safe parsing
    let host_str = config.api_host.clone();
    let port_str = config.api_port.clone();
    let ip: std::net::IpAddr = host_str.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", host_str);
        std::net::IpAddr::from([127, 0, 0, 1])
    });
    let port: u16 = port_str.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_PORT '{}', falling back to 9000", port_str);
        9000
    });
    let socket_address = SocketAddr::new(ip, port);
    tracing::info!("listening on {}", socket_address);
    axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
