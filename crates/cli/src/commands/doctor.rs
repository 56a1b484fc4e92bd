//! `docchat doctor` — Diagnose configuration and upstream reachability.

use std::path::Path;

use docchat_config::AppConfig;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 docchat Doctor — Diagnostics");
    println!("==============================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    if path.exists() {
        println!("  ✅ Config file found: {}", path.display());
    } else {
        println!("  ⚠️  No config file — defaults in use (run `docchat init`)");
    }

    let config = match AppConfig::load_with(config_path) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue found. Fix the config and re-run.");
            return Ok(());
        }
    };

    println!("     Gateway: {}", config.gateway_url);
    println!("     Model:   {}", config.model);

    if config.has_api_key() {
        println!("  ✅ API key configured");

        let provider = docchat_providers::build_from_config(&config);
        match provider.health_check().await {
            Ok(true) => println!("  ✅ AI gateway reachable"),
            Ok(false) => {
                println!("  ⚠️  AI gateway answered but reported unhealthy");
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ AI gateway unreachable: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ❌ No API key — set DOCCHAT_API_KEY or add api_key to the config");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
