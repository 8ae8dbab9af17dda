//! Config command handlers

use std::path::Path;

use anyhow::{Context, Result};

use showfolio_core::Config;

use crate::output::{Output, OutputFormat};

/// Print the effective settings and where they come from
pub fn show(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let file = Config::locate(config_path);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "config_file": file,
                    "settings": config,
                    "database": config.sqlite_path(),
                    "log": config.log_path(),
                })
            );
        }
        OutputFormat::Quiet => println!("{}", file.display()),
        OutputFormat::Human => {
            let log_file = match &config.log_file {
                Some(path) => path.display().to_string(),
                None => format!("(default: {})", config.log_path().display()),
            };
            println!("Config file: {}", file.display());
            println!();
            println!("  data_dir             {}", config.data_dir.display());
            println!("  log_file             {}", log_file);
            println!("  traffic_window_days  {}", config.traffic_window_days);
            println!("  max_failed_logins    {}", config.max_failed_logins);
        }
    }

    Ok(())
}

/// Change one setting and save the file in effect
pub fn set(key: String, value: String, config_path: Option<&Path>, output: &Output) -> Result<()> {
    let file = Config::locate(config_path);
    let mut config = Config::load(config_path).context("Failed to load configuration")?;

    config.set(&key, &value)?;
    config.write(&file).context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}
