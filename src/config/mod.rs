pub mod cli;
pub mod toml_config;

use crate::adapters::csv_reader::SUPPORTED_EXTENSIONS;
use crate::adapters::export::{ExportFormat, ExportLocale};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation;
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use toml_config::{CompareConfig, InputConfig, MonitoringConfig, OutputConfig, TomlConfig};

pub const MAX_TIMEOUT_SECONDS: u64 = 600;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "table-diff")]
#[command(about = "Compare two CSV tables record by record")]
pub struct CliConfig {
    /// TOML configuration file; flags given here override its values
    #[arg(short, long)]
    pub config: Option<String>,

    /// Baseline file (CSV or parsed table JSON)
    #[arg(long)]
    pub old_file: Option<String>,

    /// File compared against the baseline
    #[arg(long)]
    pub new_file: Option<String>,

    /// Column used to match records; row position when omitted
    #[arg(long)]
    pub primary_key: Option<String>,

    #[arg(long)]
    pub ignore_case: bool,

    /// Ignore leading and trailing whitespace
    #[arg(long)]
    pub ignore_whitespace: bool,

    #[arg(long, value_delimiter = ',')]
    pub ignored_columns: Vec<String>,

    /// Output directory [default: ./output]
    #[arg(long)]
    pub output_path: Option<String>,

    /// csv, json and/or zip [default: csv]
    #[arg(long, value_delimiter = ',')]
    pub output_formats: Vec<String>,

    #[arg(long, help = "Export only added, deleted and modified records")]
    pub only_differences: bool,

    #[arg(long, help = "Leave the summary out of CSV exports")]
    pub no_stats: bool,

    /// en or zh-tw [default: en]
    #[arg(long)]
    pub locale: Option<String>,

    /// [default: 30]
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn new(old_file: impl Into<String>, new_file: impl Into<String>) -> Self {
        Self {
            old_file: Some(old_file.into()),
            new_file: Some(new_file.into()),
            ..Self::default()
        }
    }

    /// 以 `--config` 檔（或內建預設值）為底，套用命令列上有給的參數
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut merged = match &self.config {
            Some(path) => {
                tracing::debug!("Loading base configuration from {}", path);
                TomlConfig::from_file(path)?
            }
            None => TomlConfig {
                input: InputConfig {
                    old_file: validation::validate_required_field("old_file", &self.old_file)?.clone(),
                    new_file: validation::validate_required_field("new_file", &self.new_file)?.clone(),
                },
                compare: CompareConfig::default(),
                output: OutputConfig::default(),
                monitoring: None,
            },
        };

        if let Some(old_file) = &self.old_file {
            merged.input.old_file = old_file.clone();
        }
        if let Some(new_file) = &self.new_file {
            merged.input.new_file = new_file.clone();
        }

        let compare = &mut merged.compare;
        if let Some(key) = &self.primary_key {
            compare.primary_key = Some(key.clone());
        }
        compare.ignore_case |= self.ignore_case;
        compare.ignore_whitespace |= self.ignore_whitespace;
        if !self.ignored_columns.is_empty() {
            compare.ignored_columns = self.ignored_columns.clone();
        }
        if let Some(timeout) = self.timeout_seconds {
            compare.timeout_seconds = timeout;
        }

        let output = &mut merged.output;
        if let Some(path) = &self.output_path {
            output.path = path.clone();
        }
        if !self.output_formats.is_empty() {
            output.formats = self.output_formats.clone();
        }
        output.only_differences |= self.only_differences;
        if self.no_stats {
            output.include_stats = false;
        }
        if let Some(locale) = &self.locale {
            output.locale = locale.clone();
        }

        if self.monitor {
            merged.monitoring.get_or_insert_with(MonitoringConfig::default).enabled = true;
        }

        Ok(merged)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        self.resolve()?.validate()
    }
}

/// CLI 與 TOML 設定共用的檢查
pub(crate) fn validate_common(config: &dyn ConfigProvider, locale: &str, timeout_seconds: u64) -> Result<()> {
    validation::validate_path("old_file", config.old_file())?;
    validation::validate_path("new_file", config.new_file())?;
    validation::validate_file_extension("old_file", config.old_file(), &SUPPORTED_EXTENSIONS)?;
    validation::validate_file_extension("new_file", config.new_file(), &SUPPORTED_EXTENSIONS)?;
    validation::validate_path("output_path", config.output_path())?;
    validation::validate_range("timeout_seconds", timeout_seconds, 1, MAX_TIMEOUT_SECONDS)?;

    for format in config.output_formats() {
        format.parse::<ExportFormat>()?;
    }
    locale.parse::<ExportLocale>()?;

    Ok(())
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::adapters::export::ExportOptions;
    use crate::domain::model::CompareOptions;
    use crate::utils::error::DiffError;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    const BASE_TOML: &str = r#"
[input]
old_file = "from_file_old.csv"
new_file = "from_file_new.csv"

[compare]
primary_key = "customer_id"
ignore_whitespace = true
ignored_columns = ["updated_at"]
timeout_seconds = 60

[output]
path = "./reports"
formats = ["zip"]
locale = "zh-tw"

[monitoring]
enabled = false
log_level = "warn"
"#;

    fn base_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(BASE_TOML.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_cli_args() {
        let config = CliConfig::parse_from([
            "table-diff",
            "--old-file",
            "old.csv",
            "--new-file",
            "new.csv",
            "--primary-key",
            "id",
            "--ignore-case",
            "--ignored-columns",
            "note,updated_at",
            "--output-formats",
            "csv,zip",
        ]);

        assert!(config.validate().is_ok());
        let resolved = config.resolve().unwrap();
        let options = resolved.compare_options();
        assert_eq!(options.primary_key.as_deref(), Some("id"));
        assert!(options.ignore_case);
        assert!(!options.ignore_whitespace);
        assert_eq!(options.ignored_columns, vec!["note", "updated_at"]);
        assert_eq!(resolved.output_formats(), ["csv", "zip"]);
        assert_eq!(resolved.output_path(), "./output");
        assert!(resolved.export_options().include_stats);
        assert_eq!(resolved.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_input_without_config_file() {
        let config = CliConfig::parse_from(["table-diff", "--new-file", "new.csv"]);

        let err = config.resolve().unwrap_err();
        assert!(matches!(err, DiffError::MissingConfigError { ref field } if field == "old_file"));
    }

    #[test]
    fn test_config_file_without_flags() {
        let file = base_file();
        let path = file.path().to_string_lossy().into_owned();
        let config = CliConfig::parse_from(["table-diff", "--config", path.as_str()]);

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.old_file(), "from_file_old.csv");
        assert_eq!(resolved.output_formats(), ["zip"]);
        assert_eq!(resolved.log_level(), Some("warn"));
        assert_eq!(resolved.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = base_file();
        let path = file.path().to_string_lossy().into_owned();
        let config = CliConfig::parse_from([
            "table-diff",
            "--config",
            path.as_str(),
            "--new-file",
            "override_new.csv",
            "--primary-key",
            "id",
            "--ignore-case",
            "--ignored-columns",
            "note",
            "--output-formats",
            "csv,json",
            "--output-path",
            "./elsewhere",
            "--locale",
            "en",
            "--timeout-seconds",
            "5",
            "--no-stats",
            "--only-differences",
            "--monitor",
        ]);

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.old_file(), "from_file_old.csv");
        assert_eq!(resolved.new_file(), "override_new.csv");
        assert_eq!(
            resolved.compare_options(),
            CompareOptions {
                primary_key: Some("id".to_string()),
                ignore_case: true,
                ignore_whitespace: true,
                ignored_columns: vec!["note".to_string()],
            }
        );
        assert_eq!(resolved.output_formats(), ["csv", "json"]);
        assert_eq!(resolved.output_path(), "./elsewhere");
        assert_eq!(
            resolved.export_options(),
            ExportOptions {
                include_only_differences: true,
                include_stats: false,
                locale: ExportLocale::En,
            }
        );
        assert_eq!(resolved.timeout(), Duration::from_secs(5));
        assert!(resolved.monitoring_enabled());
        assert!(resolved.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = CliConfig::new("old.xlsx", "new.csv");
        assert!(config.validate().is_err());

        config.old_file = Some("old.csv".to_string());
        assert!(config.validate().is_ok());

        config.output_formats = vec!["pdf".to_string()];
        assert!(config.validate().is_err());

        config.output_formats = vec!["json".to_string()];
        config.timeout_seconds = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_primary_key_means_positional() {
        let mut config = CliConfig::new("old.csv", "new.csv");
        config.primary_key = Some("  ".to_string());
        assert!(config.resolve().unwrap().compare_options().primary_key.is_none());
    }
}
