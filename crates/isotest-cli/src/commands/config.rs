//! Config command - print the effective runner settings

use anyhow::{Context as _, Result};
use colored::*;
use isotest_config::ConfigLoader;
use std::path::Path;

/// Run the config command
pub fn run(dir: &Path, json: bool) -> Result<()> {
    let config = ConfigLoader::new()
        .load_from_directory(dir)
        .context("failed to load configuration")?;
    let settings = config.runner();
    let project_root = config.project_root().map(|p| p.display().to_string());

    if json {
        let output = serde_json::json!({
            "project_root": project_root,
            "runner": settings,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "Runner configuration".bold());
    match project_root {
        Some(root) => println!("  project root:      {}", root),
        None => println!("  project root:      {}", "(none)".dimmed()),
    }
    println!("  default timeout:   {}s", settings.default_timeout);
    println!("  poll interval:     {}us", settings.poll_interval_us);
    println!("  color:             {}", settings.color);
    Ok(())
}
