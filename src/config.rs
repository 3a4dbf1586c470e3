use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::render::RenderOptions;
use crate::subtitles::{ParseOptions, SubtitleStrategy};
use crate::text::{WordSet, DEFAULT_STOP_WORDS};

/// Configuration for the reader
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where chapter data is read from
    pub data: DataConfig,

    /// Word sizing and span classes
    pub render: RenderOptions,

    /// Word frequency counting
    pub frequency: FrequencyConfig,

    /// Subtitle parsing and placement
    pub subtitles: SubtitleConfig,

    /// Logging settings
    pub output: OutputConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Local data directory
    pub data_dir: PathBuf,

    /// Remote data root; takes precedence over `data_dir` when set
    pub base_url: Option<String>,

    /// HTTP request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Chapter index file name
    pub index_file: String,

    /// Tooltip table file name
    pub tooltips_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyConfig {
    /// Words left out of the frequency table
    pub stop_words: Vec<String>,

    /// Words counted even when listed as stop words
    pub protected_words: Vec<String>,
}

impl FrequencyConfig {
    pub fn stop_set(&self) -> WordSet {
        WordSet::new(&self.stop_words)
    }

    pub fn protected_set(&self) -> WordSet {
        WordSet::new(&self.protected_words)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// Remove inline markup from caption text
    pub strip_markup: bool,

    /// Drop captions with no text
    pub ignore_empty: bool,

    /// Placement strategy for chapters with a subtitle track
    pub strategy: SubtitleStrategy,

    /// Minimum word overlap for fuzzy tagging (exclusive)
    pub fuzzy_threshold: f64,
}

impl SubtitleConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            strip_markup: self.strip_markup,
            ignore_empty: self.ignore_empty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Log level
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen port
    pub port: u16,

    /// Directory with stylesheets and scripts served under /static
    pub static_dir: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            base_url: None,
            request_timeout_seconds: 30,
            index_file: "chapters.json".to_string(),
            tooltips_file: "tooltips.json".to_string(),
        }
    }
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            protected_words: Vec::new(),
        }
    }
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            strip_markup: true,
            ignore_empty: true,
            strategy: SubtitleStrategy::Align,
            fuzzy_threshold: crate::subtitles::fuzzy::DEFAULT_THRESHOLD,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            static_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = ["vocab-reader.toml", "config/vocab-reader.toml"];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path).map_err(|e| anyhow!("Cannot read {}: {}", path, e))?;
        Ok(toml::from_str(&config_str)?)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(data_dir) = std::env::var("VOCAB_READER_DATA_DIR") {
            config.data.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(base_url) = std::env::var("VOCAB_READER_BASE_URL") {
            config.data.base_url = Some(base_url);
        }

        if let Ok(log_level) = std::env::var("VOCAB_READER_LOG_LEVEL") {
            config.output.log_level = log_level;
        }

        if let Ok(port) = std::env::var("VOCAB_READER_PORT") {
            config.server.port = port
                .parse()
                .map_err(|e| anyhow!("Invalid VOCAB_READER_PORT {}: {}", port, e))?;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.render.base_font_size > 0.0) {
            return Err(anyhow!("base_font_size must be greater than 0"));
        }

        if !(self.render.max_font_size_increase >= 0.0) {
            return Err(anyhow!("max_font_size_increase must not be negative"));
        }

        let threshold = self.subtitles.fuzzy_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(anyhow!("fuzzy_threshold must be in (0, 1], got {}", threshold));
        }

        if let Some(base_url) = &self.data.base_url {
            url::Url::parse(base_url).map_err(|e| anyhow!("Invalid base_url {}: {}", base_url, e))?;
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Vocab Reader Configuration:\n\
            - Data Source: {}\n\
            - Font Size: {}px (+{}px max)\n\
            - Stop Words: {}\n\
            - Subtitle Strategy: {:?}\n\
            - Server Port: {}",
            self.data
                .base_url
                .clone()
                .unwrap_or_else(|| self.data.data_dir.display().to_string()),
            self.render.base_font_size,
            self.render.max_font_size_increase,
            self.frequency.stop_words.len(),
            self.subtitles.strategy,
            self.server.port
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.config.data.data_dir = dir;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.config.data.base_url = Some(base_url);
        self
    }

    pub fn with_font_sizes(mut self, base: f64, max_increase: f64) -> Self {
        self.config.render.base_font_size = base;
        self.config.render.max_font_size_increase = max_increase;
        self
    }

    pub fn with_stop_words(mut self, words: Vec<String>) -> Self {
        self.config.frequency.stop_words = words;
        self
    }

    pub fn with_protected_words(mut self, words: Vec<String>) -> Self {
        self.config.frequency.protected_words = words;
        self
    }

    pub fn with_subtitle_strategy(mut self, strategy: SubtitleStrategy) -> Self {
        self.config.subtitles.strategy = strategy;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.render.base_font_size, 16.0);
        assert_eq!(config.render.max_font_size_increase, 12.0);
        assert!(config.subtitles.strip_markup);
        assert!(config.frequency.stop_set().contains("the"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_font_sizes(14.0, 10.0)
            .with_protected_words(vec!["The".to_string()])
            .with_subtitle_strategy(SubtitleStrategy::Fuzzy)
            .build();

        assert_eq!(config.render.base_font_size, 14.0);
        assert!(config.frequency.protected_set().contains("the"));
        assert_eq!(config.subtitles.strategy, SubtitleStrategy::Fuzzy);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.subtitles.fuzzy_threshold = 1.5;
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new().with_font_sizes(0.0, 12.0).build();
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new().with_base_url("not a url".to_string()).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [render]
            base_font_size = 18.0
            max_font_size_increase = 6.0
            tooltip_class = "tip"
            frequency_class = "freq"

            [subtitles]
            strategy = "fuzzy"
            "#,
        )
        .unwrap();

        assert_eq!(config.render.base_font_size, 18.0);
        assert_eq!(config.render.tooltip_class, "tip");
        assert_eq!(config.subtitles.strategy, SubtitleStrategy::Fuzzy);
        assert!(config.subtitles.ignore_empty);
        assert_eq!(config.data.index_file, "chapters.json");
    }
}
