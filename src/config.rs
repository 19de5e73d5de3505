use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub model: ModelConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Upper bound on in-flight classifier calls within one request.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            classifier_timeout_ms: default_classifier_timeout_ms(),
        }
    }
}

impl AnalysisConfig {
    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }
}

fn default_max_concurrency() -> usize {
    8
}
fn default_classifier_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Defaults for commands that can run without a config file.
    pub fn minimal() -> Self {
        Self {
            model: ModelConfig {
                path: PathBuf::from("./models/ai_detector.json"),
            },
            analysis: AnalysisConfig::default(),
            server: ServerConfig {
                bind: "127.0.0.1:5000".to_string(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.analysis.max_concurrency == 0 {
        anyhow::bail!("analysis.max_concurrency must be >= 1");
    }

    if config.analysis.classifier_timeout_ms == 0 {
        anyhow::bail!("analysis.classifier_timeout_ms must be >= 1");
    }

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if config.model.path.as_os_str().is_empty() {
        anyhow::bail!("model.path must not be empty");
    }

    Ok(())
}
