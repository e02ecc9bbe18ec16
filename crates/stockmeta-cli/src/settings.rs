use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Subcommand;

use stockmeta_config::Settings;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the effective settings (secrets masked)
    Show,
    /// Set one value in the settings file
    Set { key: String, value: String },
}

pub fn run(action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let mut settings =
                stockmeta_config::load_settings().context("Failed to load settings")?;
            mask_secrets(&mut settings);
            println!("{}", serde_json::to_string_pretty(&settings)?);
            println!("# file: {}", stockmeta_config::settings_file_path()?.display());
        }
        SettingsAction::Set { key, value } => {
            let path = stockmeta_config::settings_file_path()?;
            let mut settings = stockmeta_config::load_settings_from(&path)?;
            apply_setting(&mut settings, &key, &value)?;
            stockmeta_config::save_settings(&settings).context("Failed to save settings")?;
            println!("Saved {key}");
        }
    }
    Ok(())
}

fn mask(secret: &mut String) {
    let visible: String = secret.chars().take(4).collect();
    if !secret.is_empty() {
        *secret = format!("{visible}…");
    }
}

fn mask_secrets(settings: &mut Settings) {
    mask(&mut settings.groq_api_key);
    mask(&mut settings.everypixel_secret);
}

/// Set a settings value by its key name.
pub fn apply_setting(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    match key {
        "groq_api_key" => settings.groq_api_key = value.to_string(),
        "everypixel_id" => settings.everypixel_id = value.to_string(),
        "everypixel_secret" => settings.everypixel_secret = value.to_string(),
        "save_dir" => {
            settings.save_dir = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        "base_url" => settings.provider.base_url = value.to_string(),
        "vision_model" => settings.provider.vision_model = value.to_string(),
        "text_model" => settings.provider.text_model = value.to_string(),
        "vision_timeout_secs" => settings.provider.vision_timeout_secs = parse_number(key, value)?,
        "text_timeout_secs" => settings.provider.text_timeout_secs = parse_number(key, value)?,
        "keyword_timeout_secs" => {
            settings.keyword_service.timeout_secs = parse_number(key, value)?
        }
        "thumbnail_concurrency" => {
            settings.thumbnail_concurrency = parse_number::<usize>(key, value)?.max(1)
        }
        other => bail!("Unknown setting '{other}'"),
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{key} expects a number, got '{value}'"))
}
