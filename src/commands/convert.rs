use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use plan2ical_core::convert::default_output_path;
use plan2ical_core::{CategoryStyle, ConvertConfig, Converter};

use crate::render::Render;

pub struct ConvertArgs {
    pub input: PathBuf,
    pub delimiter: Option<String>,
    pub max: Option<usize>,
    pub config: Option<PathBuf>,
    pub categories: Option<String>,
    pub timezone: Option<String>,
    pub venue: Option<String>,
    pub output: Option<PathBuf>,
}

pub fn run(args: ConvertArgs) -> Result<()> {
    let mut config = ConvertConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args)?;

    let converter = Converter::new(&config)?;
    let conversion = converter
        .convert_file(&args.input, args.delimiter.as_deref())
        .with_context(|| format!("Could not convert {}", args.input.display()))?;

    // Only write once the whole run has succeeded
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    log::debug!(
        "Writing {} events to {}",
        conversion.report.events_written,
        output.display()
    );
    std::fs::write(&output, &conversion.bytes)
        .with_context(|| format!("Could not write {}", output.display()))?;

    println!("{}", conversion.report.render());
    println!("{} {}", "iCal file saved to".green(), output.display());

    Ok(())
}

/// CLI flags win over the config file and environment.
fn apply_overrides(config: &mut ConvertConfig, args: &ConvertArgs) -> Result<()> {
    if let Some(max) = args.max {
        config.max_events = max;
    }
    if let Some(ref style) = args.categories {
        config.category_style = style.parse::<CategoryStyle>()?;
    }
    if let Some(ref timezone) = args.timezone {
        config.timezone = timezone.clone();
    }
    if let Some(ref venue) = args.venue {
        config.venue = Some(venue.clone());
    }
    Ok(())
}
