use crate::{error::Result, logging::init_file_logger};
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const RESOURCES_ENV: &str = "GDPS_RESOURCES_PATH";
pub const QUALITY_ENV: &str = "GDPS_ICON_QUALITY";

/// Asset resolution. Files for `Medium` carry `-hd`, for `High` `-uhd`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    /// Unset or unrecognized values fall back to medium.
    pub fn from_setting(value: &str) -> Quality {
        match value.trim() {
            "" => Quality::Low,
            "hd" => Quality::Medium,
            "uhd" => Quality::High,
            _ => Quality::Medium,
        }
    }

    pub fn file_suffix(self) -> &'static str {
        match self {
            Quality::Low => "",
            Quality::Medium => "-hd",
            Quality::High => "-uhd",
        }
    }

    /// Pixels per game point for sheets of this quality.
    pub fn scale_factor(self) -> f32 {
        match self {
            Quality::Low => 1.0,
            Quality::Medium => 2.0,
            Quality::High => 4.0,
        }
    }

    /// Horizontal gap between icons in a strip.
    pub fn icon_spacing(self) -> u32 {
        match self {
            Quality::Low => 12,
            Quality::Medium => 25,
            Quality::High => 50,
        }
    }

    /// Requested quality first, then medium, low and high.
    pub fn fallback_order(self) -> Vec<Quality> {
        let mut order = vec![self];
        for quality in [Quality::Medium, Quality::Low, Quality::High] {
            if !order.contains(&quality) {
                order.push(quality);
            }
        }
        order
    }
}

impl From<String> for Quality {
    fn from(value: String) -> Self {
        Quality::from_setting(&value)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Quality::Low => "low",
            Quality::Medium => "hd",
            Quality::High => "uhd",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub resources: PathBuf,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: LevelFilter,
}

fn default_log_level() -> LevelFilter {
    LevelFilter::Info
}

impl Config {
    pub fn new(resources: impl Into<PathBuf>) -> Self {
        Config {
            resources: resources.into(),
            quality: Quality::default(),
            log_file: None,
            log_level: default_log_level(),
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str::<Config>(text)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn from_env() -> Self {
        let resources = std::env::var(RESOURCES_ENV).unwrap_or_else(|_| String::from("resources"));
        let quality = std::env::var(QUALITY_ENV)
            .map(|value| Quality::from_setting(&value))
            .unwrap_or_default();
        Config::new(resources).with_quality(quality)
    }

    /// Installs the file logger when `log_file` is set. Without one, logging is left to the host.
    pub fn init_logging(&self) -> Result<()> {
        match &self.log_file {
            Some(path) => init_file_logger(path, self.log_level),
            None => Ok(()),
        }
    }

    pub fn icons_dir(&self) -> PathBuf {
        self.resources.join("icons")
    }
}
