use crate::adapters::export::ExportOptions;
use crate::core::ConfigProvider;
use crate::domain::model::CompareOptions;
use crate::utils::error::{DiffError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub old_file: String,
    pub new_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub primary_key: Option<String>,
    pub ignore_case: bool,
    pub ignore_whitespace: bool,
    pub ignored_columns: Vec<String>,
    pub timeout_seconds: u64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            primary_key: None,
            ignore_case: false,
            ignore_whitespace: false,
            ignored_columns: Vec::new(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
    pub only_differences: bool,
    pub include_stats: bool,
    pub locale: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            formats: vec!["csv".to_string()],
            only_differences: false,
            include_stats: true,
            locale: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DiffError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DiffError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DiffError::ConfigError {
            message: format!("Invalid env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        super::validate_common(self, &self.output.locale, self.compare.timeout_seconds)?;

        if let Some(level) = self.log_level() {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(DiffError::InvalidConfigValueError {
                    field: "monitoring.log_level".to_string(),
                    value: level.to_string(),
                    reason: format!("Log level must be one of: {}", LOG_LEVELS.join(", ")),
                });
            }
        }
        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn old_file(&self) -> &str {
        &self.input.old_file
    }

    fn new_file(&self) -> &str {
        &self.input.new_file
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            primary_key: self
                .compare
                .primary_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            ignore_case: self.compare.ignore_case,
            ignore_whitespace: self.compare.ignore_whitespace,
            ignored_columns: self.compare.ignored_columns.clone(),
        }
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            include_only_differences: self.output.only_differences,
            include_stats: self.output.include_stats,
            locale: self.output.locale.parse().unwrap_or_default(),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.compare.timeout_seconds)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
