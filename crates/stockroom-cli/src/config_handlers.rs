//! Handlers for `stockroom config ...`.
//!
//! Handlers print to stdout, so tests assert on their side effects (files
//! written, errors returned) and on the pure helpers below.

use std::path::PathBuf;

use crate::cli::ConfigAction;
use crate::config::{PROJECT_NAME, StockroomConfig};
use crate::error::{Error, Result};

/// Dispatch a config subcommand.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => cmd_config_show(config_path),
        ConfigAction::Get { key } => cmd_config_get(config_path, &key),
        ConfigAction::Init { file, force } => cmd_config_init(file.as_deref(), force),
    }
}

/// Print the config file location.
pub fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    let path = StockroomConfig::resolve_config_path(config_path).ok_or_else(|| {
        Error::config("Could not determine config directory for this platform")
    })?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist; run `{PROJECT_NAME} config init` to create it)");
    }
    Ok(())
}

/// Print the effective configuration, environment overrides included.
pub fn cmd_config_show(config_path: Option<&str>) -> Result<()> {
    let config = StockroomConfig::load_with_env(config_path)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Print one value by dotted key, e.g. `session.login_route`.
pub fn cmd_config_get(config_path: Option<&str>, key: &str) -> Result<()> {
    let config = StockroomConfig::load_with_env(config_path)?;
    println!("{}", lookup(&config, key)?);
    Ok(())
}

/// Write a default config file.
pub fn cmd_config_init(file: Option<&str>, force: bool) -> Result<()> {
    let path = init_config_file(file, force)?;
    println!("Config file created at {}", path.display());
    Ok(())
}

/// Create the default config file and return where it went.
pub fn init_config_file(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => StockroomConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = StockroomConfig::default().to_toml_string()?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}

/// Render the value at dotted `key`.
pub fn lookup(config: &StockroomConfig, key: &str) -> Result<String> {
    let value = toml::Value::try_from(config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Walk a dotted key through nested tables.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Strings print bare; everything else prints as TOML.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
            format!("[{}]", rendered.join(", "))
        }
        toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
