//! Converter configuration.
//!
//! Every key has a built-in default. Values are layered, later wins:
//! defaults, the TOML file, `PLAN2ICAL_*` environment variables, then
//! whatever the caller overrides on the loaded struct (CLI flags).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::datetime::PatternSet;
use crate::error::{ConvertError, ConvertResult};

pub const DEFAULT_PRODUCT_ID: &str = "-//suhler-sternfreunde.de//";
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";
pub const DEFAULT_MAX_EVENTS: usize = 50;
pub const DEFAULT_EVENT_MINUTES: u32 = 60;
pub const DEFAULT_UNTITLED: &str = "Untitled Event";
pub const DEFAULT_HEADER_MARKER: &str = "Datum";

static ENV_PREFIX: &str = "PLAN2ICAL";

/// How derived category labels end up in the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStyle {
    /// One DESCRIPTION text, labels joined by ", ". Plone imports this cleanly.
    #[default]
    Description,
    /// A multi-value CATEGORIES property.
    Categories,
}

impl CategoryStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryStyle::Description => "description",
            CategoryStyle::Categories => "categories",
        }
    }
}

impl fmt::Display for CategoryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryStyle {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "description" => Ok(CategoryStyle::Description),
            "categories" => Ok(CategoryStyle::Categories),
            other => Err(ConvertError::Config(format!(
                "Unknown category style '{other}' (expected 'description' or 'categories')"
            ))),
        }
    }
}

/// Texts used to derive category labels from a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    /// Case-sensitive substring looked up in the location cell.
    pub keyword: String,
    /// Label added when the keyword matches.
    pub keyword_label: String,
    /// Label for a minimum age; `{age}` is replaced by the cell text.
    pub age_template: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            keyword: "Planetarium".to_string(),
            keyword_label: "planetarium showing".to_string(),
            age_template: "from age {age} years".to_string(),
        }
    }
}

impl Labels {
    pub fn age_label(&self, age: &str) -> String {
        self.age_template.replace("{age}", age)
    }
}

/// Configuration for one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub product_id: String,
    pub timezone: String,
    pub max_events: usize,
    pub event_minutes: u32,
    pub category_style: CategoryStyle,
    pub untitled: String,

    /// Fixed LOCATION for every event; the row's location cell is used otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    /// A leading row whose date cell contains this text is treated as a header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_marker: Option<String>,

    pub labels: Labels,
    pub patterns: PatternSet,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            max_events: DEFAULT_MAX_EVENTS,
            event_minutes: DEFAULT_EVENT_MINUTES,
            category_style: CategoryStyle::default(),
            untitled: DEFAULT_UNTITLED.to_string(),
            venue: None,
            header_marker: Some(DEFAULT_HEADER_MARKER.to_string()),
            labels: Labels::default(),
            patterns: PatternSet::default(),
        }
    }
}

impl ConvertConfig {
    /// Default location: ~/.config/plan2ical/config.toml
    pub fn config_path() -> ConvertResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConvertError::Config("Could not determine config directory".into()))?
            .join("plan2ical");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from `explicit` (must exist) or the default path
    /// (optional), with environment overrides applied on top.
    pub fn load(explicit: Option<&Path>) -> ConvertResult<Self> {
        let (path, required) = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConvertError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                (path.to_path_buf(), true)
            }
            None => match Self::config_path() {
                Ok(path) => (path, false),
                Err(_) => {
                    let config = Self::default();
                    config.validate()?;
                    return Ok(config);
                }
            },
        };

        let config: ConvertConfig = Config::builder()
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConvertError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConvertError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text, without environment overrides.
    pub fn from_toml(content: &str) -> ConvertResult<Self> {
        let config: ConvertConfig =
            toml::from_str(content).map_err(|e| ConvertError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> ConvertResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConvertError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ConvertResult<()> {
        if self.max_events == 0 {
            return Err(ConvertError::Config("max_events must be at least 1".into()));
        }
        if self.event_minutes == 0 {
            return Err(ConvertError::Config(
                "event_minutes must be at least 1".into(),
            ));
        }
        if self.product_id.trim().is_empty() {
            return Err(ConvertError::Config("product_id must not be empty".into()));
        }
        if self.patterns.date_formats.is_empty() {
            return Err(ConvertError::Config(
                "patterns.date_formats must list at least one format".into(),
            ));
        }
        self.zone()?;
        Ok(())
    }

    /// The regional zone applied to every timed event.
    pub fn zone(&self) -> ConvertResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConvertError::Config(format!("Unknown timezone '{}': {e}", self.timezone)))
    }

    /// Header marker, with an empty marker meaning "no header detection".
    pub fn header_marker(&self) -> Option<&str> {
        self.header_marker
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ConvertResult<()> {
        let contents = format!(
            "\
# plan2ical configuration

# PRODID of the generated calendar:
# product_id = \"{DEFAULT_PRODUCT_ID}\"

# Zone for every event with a time of day:
# timezone = \"{DEFAULT_TIMEZONE}\"

# Maximum number of rows read from a table:
# max_events = {DEFAULT_MAX_EVENTS}

# Length of an event with a clock time (minutes):
# event_minutes = {DEFAULT_EVENT_MINUTES}

# Where derived labels go: \"description\" or \"categories\"
# category_style = \"description\"

# Title for rows without one:
# untitled = \"{DEFAULT_UNTITLED}\"

# Fixed location for every event:
# venue = \"Sternwarte Suhl\"

# First-row text that marks a header row (empty disables):
# header_marker = \"{DEFAULT_HEADER_MARKER}\"

# [labels]
# keyword = \"Planetarium\"
# keyword_label = \"planetarium showing\"
# age_template = \"from age {{age}} years\"

# [patterns]
# date_formats = [\"%d.%m.%y\", \"%d.%m.%Y\", \"%d/%m/%y\", \"%d/%m/%Y\", \"%Y-%m-%d\"]
# time_formats = [\"%H:%M\", \"%H.%M\", \"%H:%M:%S\"]
# noise_tokens = [\"Uhr\"]
# open_end_marker = \"ab\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConvertError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ConvertError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
