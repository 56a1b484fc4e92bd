//! `docchat serve` — Start the HTTP server.

use std::path::Path;

use docchat_config::AppConfig;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config =
        AppConfig::load_with(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.server.port = port;
    }

    println!("📄 docchat server");
    println!("   Listening: {}:{}", config.server.host, config.server.port);
    println!("   Endpoint:  POST /chat-with-pdf");
    println!("   Model:     {}", config.model);
    if !config.has_api_key() {
        println!("   ⚠️  No API key: set DOCCHAT_API_KEY or run `docchat init`");
    }

    docchat_gateway::start(config).await?;

    Ok(())
}
