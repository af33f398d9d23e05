use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use shared::domain::Orientation;

pub const DEFAULT_SETTINGS_FILE: &str = "simulator.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub query: String,
    pub width: f64,
    pub height: f64,
    pub orientation: Orientation,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            query: "(orientation: landscape)".into(),
            width: 400.0,
            height: 800.0,
            orientation: Orientation::Portrait,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    query: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    orientation: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, overlaid by the settings file, overlaid by `APP__*` variables.
///
/// A missing file is not an error unless it was named explicitly.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_SETTINGS_FILE), false),
    };
    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(err) if required => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.query {
        settings.query = v;
    }
    if let Some(v) = file_cfg.width {
        settings.width = v;
    }
    if let Some(v) = file_cfg.height {
        settings.height = v;
    }
    if let Some(v) = file_cfg.orientation {
        settings.orientation = v.parse()?;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("APP__QUERY") {
        settings.query = v;
    }
    if let Some(v) = lookup("APP__WIDTH") {
        settings.width = v
            .parse()
            .with_context(|| format!("APP__WIDTH is not a number: '{v}'"))?;
    }
    if let Some(v) = lookup("APP__HEIGHT") {
        settings.height = v
            .parse()
            .with_context(|| format!("APP__HEIGHT is not a number: '{v}'"))?;
    }
    if let Some(v) = lookup("APP__ORIENTATION") {
        settings.orientation = v.parse()?;
    }
    if let Some(v) = lookup("RUST_LOG").or_else(|| lookup("APP__LOG_FILTER")) {
        settings.log_filter = v;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
