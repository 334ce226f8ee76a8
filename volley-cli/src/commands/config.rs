//! `volley config`

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;
use tracing::{error, info};
use volley_config::{ConfigLoader, VolleyConfig};

/// Handle configuration validation
pub fn handle_config_validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_) => {
            println!("{} Configuration file is valid", "✓".green());
            Ok(())
        }
        Err(e) => {
            println!("{} Configuration validation failed: {}", "✗".red(), e);
            error!("Configuration validation failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handle configuration generation
pub fn handle_config_generate(output: &Path, force: bool) -> Result<()> {
    info!("Generating sample configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create output directory")?;
        }
    }

    fs::write(output, VolleyConfig::generate_sample())
        .context("Failed to write configuration file")?;

    println!("{} Sample configuration written to {:?}", "✓".green(), output);
    println!(
        "Validate with: volley config validate --config-file {:?}",
        output
    );
    Ok(())
}

/// Handle configuration display
pub fn handle_config_show(config: &VolleyConfig, format: &str) -> Result<()> {
    let rendered = render_config(config, format)?;
    println!("{}", rendered);
    Ok(())
}

fn render_config(config: &VolleyConfig, format: &str) -> Result<String> {
    let mut value = serde_json::to_value(config).context("Failed to serialize config")?;

    // Never echo the bot token
    if let Some(token) = value.pointer_mut("/notify/token") {
        *token = serde_json::Value::String("***".to_string());
    }

    match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(&value).context("Failed to serialize to YAML"),
        "json" => serde_json::to_string_pretty(&value).context("Failed to serialize to JSON"),
        _ => Err(anyhow::anyhow!(
            "Unknown output format: {}. Valid formats: yaml, json",
            format
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use volley_config::NotifyConfig;

    #[test]
    fn test_generate_then_validate() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("conf/volley.yaml");

        handle_config_generate(&output, false).unwrap();
        handle_config_validate(&output).unwrap();

        // Refuses to overwrite without --force
        assert!(handle_config_generate(&output, false).is_err());
        handle_config_generate(&output, true).unwrap();
    }

    #[test]
    fn test_show_masks_token() {
        let config = VolleyConfig {
            notify: Some(NotifyConfig {
                api_base: "https://api.telegram.org".to_string(),
                token: "secret-token".to_string(),
                chat_id: 1,
            }),
            ..VolleyConfig::default()
        };

        let json = render_config(&config, "json").unwrap();
        assert!(!json.contains("secret-token"));
        assert!(json.contains("***"));
        assert!(render_config(&config, "toml").is_err());
    }
}
