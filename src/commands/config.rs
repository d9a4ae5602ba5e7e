use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use plan2ical_core::ConvertConfig;

pub fn run(explicit: Option<&Path>) -> Result<()> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => ConvertConfig::config_path()?,
    };

    if explicit.is_none() && !config_path.exists() {
        ConvertConfig::create_default_config(&config_path)?;
        println!("Created {}", config_path.display());
    }

    let config = ConvertConfig::load(explicit)?;

    println!("{}", "Paths".bold());
    println!("  Config:  {}", config_path.display());
    println!();
    println!("{}", "Effective configuration".bold());
    print!("{}", config.to_toml()?);

    Ok(())
}
