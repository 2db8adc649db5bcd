//! Preferences commands for CLI.

use clap::Subcommand;
use studyplan_core::Preferences;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective preferences
    Show,
    /// Set a preference value by dotted path (e.g. "study_window.start")
    Set {
        /// Preference key
        key: String,
        /// New value
        value: String,
    },
    /// Print the preferences file path
    Path,
    /// Reset preferences to defaults
    Reset,
}

/// Parse a raw CLI string into the most specific TOML value it can be.
fn parse_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(raw.to_string())
}

/// Set a dotted-path key inside a TOML table, creating intermediate tables
/// as needed.
fn set_path(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<(), String> {
    let mut current = root;
    let parts: Vec<&str> = key.split('.').collect();
    for part in &parts[..parts.len() - 1] {
        let table = current
            .as_table_mut()
            .ok_or_else(|| format!("'{part}' is not a table"))?;
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(Default::default()));
    }
    let table = current
        .as_table_mut()
        .ok_or_else(|| format!("'{key}' does not name a settable value"))?;
    table.insert(parts[parts.len() - 1].to_string(), value);
    Ok(())
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let prefs = Preferences::load()?;
            println!("{}", toml::to_string_pretty(&prefs)?);
        }
        ConfigAction::Set { key, value } => {
            let prefs = Preferences::load()?;
            let mut doc = toml::Value::try_from(&prefs)?;
            set_path(&mut doc, &key, parse_value(&value))?;
            // Round-trip through the typed struct so a bad key or value is
            // rejected before anything is written.
            let updated: Preferences = doc.try_into().map_err(|e| format!("invalid value for '{key}': {e}"))?;
            updated.save()?;
            println!("ok");
        }
        ConfigAction::Path => {
            println!("{}", Preferences::config_path()?.display());
        }
        ConfigAction::Reset => {
            Preferences::default().save()?;
            println!("preferences reset to defaults");
        }
    }
    Ok(())
}
