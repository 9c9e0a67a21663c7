use super::render;
use crate::config::Settings;
use anyhow::Result;
use colored::*;

/// Show the effective configuration
pub fn show(settings: &Settings, format: String) -> Result<()> {
    let mut value = serde_json::to_value(settings)?;
    if let Some(fields) = value.as_object_mut() {
        let source = settings
            .source
            .as_ref()
            .map(|path| path.display().to_string());
        fields.insert("source".to_string(), source.into());
    }

    render(&format, &value, || print_settings_text(settings))
}

/// Print the configuration in a formatted text output
fn print_settings_text(settings: &Settings) {
    println!("{}", "=== TwinGuard Configuration ===".bold());
    println!();

    match &settings.source {
        Some(path) => println!("{}: {}", "source".cyan(), path.display()),
        None => println!("{}: {}", "source".cyan(), "(defaults)".yellow()),
    }
    println!("{}: {}", "strategy".cyan(), settings.strategy);
    println!(
        "{}: {}",
        "default_permissions".cyan(),
        settings.default_permissions.join(", ")
    );
    println!("{}", "[logging]".cyan().bold());
    println!("  {}: {}", "level".cyan(), settings.logging.level);
    match &settings.logging.directory {
        Some(directory) => println!("  {}: {}", "directory".cyan(), directory.display()),
        None => println!("  {}: {}", "directory".cyan(), "(stderr only)".yellow()),
    }
}
