//! Configuration loader for location-seeder
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::SeedError;
use crate::core::logging::{LogFormat, LogLevel};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".seeder-config.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Directory searched for `.seeder-config.yaml`
    pub project_path: PathBuf,

    /// Explicit config file; must exist when given
    pub config_path: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub cli_args: Option<SeederConfigFile>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field name (e.g., "baseUrl")
    pub field: String,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables (`SEEDER_*`)
    /// 3. Config file (explicit path, or `./.seeder-config.yaml`)
    /// 4. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<SeederConfig, SeedError> {
        let mut config = SeederConfig::default();

        let file_config = match &options.config_path {
            Some(path) => {
                let loaded = Self::load_config_file(path).await?;
                Some(loaded.ok_or_else(|| {
                    SeedError::ConfigError(format!("Config file not found: {}", path.display()))
                })?)
            }
            None => {
                Self::load_config_file(&options.project_path.join(CONFIG_FILENAME)).await?
            }
        };

        if let Some(file_config) = file_config {
            config.apply(file_config);
        }

        config.apply(Self::load_env_config(&options.env)?);

        if let Some(cli_config) = options.cli_args {
            config.apply(cli_config);
        }

        Ok(Self::expand_env_vars(config, &options.env))
    }

    /// Load configuration from a YAML file, `None` if it does not exist
    async fn load_config_file(file_path: &Path) -> Result<Option<SeederConfigFile>, SeedError> {
        if !fs::try_exists(file_path).await.unwrap_or(false) {
            debug!(path = %file_path.display(), "No config file");
            return Ok(None);
        }

        let content = fs::read_to_string(file_path).await.map_err(|e| {
            SeedError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: SeederConfigFile = serde_yaml::from_str(&content).map_err(|e| {
            SeedError::ConfigError(format!("Failed to parse YAML config: {}", e))
        })?;

        debug!(path = %file_path.display(), "Loaded config file");
        Ok(Some(config))
    }

    /// Load configuration from `SEEDER_*` environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Result<SeederConfigFile, SeedError> {
        let mut config = SeederConfigFile::default();

        if let Some(base_url) = env.get("SEEDER_BASE_URL") {
            config.base_url = Some(base_url.clone());
        }

        if let Some(input) = env.get("SEEDER_INPUT") {
            config.input_path = Some(PathBuf::from(input));
        }

        if let Some(delimiter) = env.get("SEEDER_DELIMITER") {
            config.delimiter = Some(Self::parse_delimiter(delimiter)?);
        }

        if let Some(delay) = env.get("SEEDER_REQUEST_DELAY_MS") {
            config.request_delay_ms = Some(Self::parse_number("SEEDER_REQUEST_DELAY_MS", delay)?);
        }

        if let Some(timeout) = env.get("SEEDER_TIMEOUT_SECS") {
            config.request_timeout_secs = Some(Self::parse_number("SEEDER_TIMEOUT_SECS", timeout)?);
        }

        if let Some(report) = env.get("SEEDER_REPORT_PATH") {
            config.report_path = Some(PathBuf::from(report));
        }

        let level = env
            .get("SEEDER_LOG_LEVEL")
            .map(|s| s.parse::<LogLevel>())
            .transpose()
            .map_err(|e: anyhow::Error| SeedError::ConfigError(e.to_string()))?;
        let format = env
            .get("SEEDER_LOG_FORMAT")
            .map(|s| s.parse::<LogFormat>())
            .transpose()
            .map_err(|e: anyhow::Error| SeedError::ConfigError(e.to_string()))?;

        if level.is_some() || format.is_some() {
            config.logging = Some(LoggingConfig { level, format });
        }

        Ok(config)
    }

    fn parse_number(name: &str, value: &str) -> Result<u64, SeedError> {
        value.trim().parse().map_err(|_| {
            SeedError::ConfigError(format!("{} must be a non-negative integer, got '{}'", name, value))
        })
    }

    /// A single character, or a literal `\t` for tab
    fn parse_delimiter(value: &str) -> Result<char, SeedError> {
        if value == "\\t" {
            return Ok('\t');
        }

        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(SeedError::ConfigError(format!(
                "SEEDER_DELIMITER must be a single character, got '{}'",
                value
            ))),
        }
    }

    /// Expand `${VAR}` references in the base URL and report path
    fn expand_env_vars(mut config: SeederConfig, env: &HashMap<String, String>) -> SeederConfig {
        config.base_url = Self::expand_string(&config.base_url, env);

        if let Some(report_path) = &config.report_path {
            let expanded = Self::expand_string(&report_path.to_string_lossy(), env);
            config.report_path = Some(PathBuf::from(expanded));
        }

        config
    }

    /// Expand environment variables in a single string
    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        let Ok(env_var_regex) = Regex::new(ENV_VAR_PATTERN) else {
            return input.to_string();
        };

        let mut result = input.to_string();
        for cap in env_var_regex.captures_iter(input) {
            let var_name = &cap[1];

            if let Some(value) = env.get(var_name) {
                result = result.replace(&format!("${{{}}}", var_name), value);
            } else {
                warn!(variable = var_name, "Environment variable not found, leaving reference in place");
            }
        }

        result
    }

    /// `${VAR}` references still present after expansion
    fn unresolved_references(input: &str) -> Vec<String> {
        let Ok(env_var_regex) = Regex::new(ENV_VAR_PATTERN) else {
            return Vec::new();
        };

        env_var_regex
            .captures_iter(input)
            .map(|cap| cap[1].to_string())
            .collect()
    }

    /// Validate configuration
    pub fn validate(config: &SeederConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Base URL
        match reqwest::Url::parse(&config.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ConfigValidationError {
                field: "baseUrl".to_string(),
                message: "Unsupported URL scheme".to_string(),
                expected: Some("http or https".to_string()),
                actual: Some(url.scheme().to_string()),
            }),
            Err(e) => errors.push(ConfigValidationError {
                field: "baseUrl".to_string(),
                message: format!("Invalid URL: {}", e),
                expected: Some("absolute URL (e.g., https://host/api)".to_string()),
                actual: Some(config.base_url.clone()),
            }),
        }

        // 2. Input path
        if config.input_path.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "inputPath".to_string(),
                message: "Input path is required".to_string(),
                expected: Some("path to a CSV file".to_string()),
                actual: Some("empty".to_string()),
            });
        }

        // 3. Timeout
        if config.request_timeout_secs == 0 {
            errors.push(ConfigValidationError {
                field: "requestTimeoutSecs".to_string(),
                message: "Timeout must be greater than zero".to_string(),
                expected: Some("> 0".to_string()),
                actual: Some("0".to_string()),
            });
        }

        // 4. Delimiter
        if let Err(e) = config.delimiter_byte() {
            errors.push(ConfigValidationError {
                field: "delimiter".to_string(),
                message: e.to_string(),
                expected: Some("single ASCII character".to_string()),
                actual: Some(config.delimiter.to_string()),
            });
        }

        // 5. Delay
        if config.request_delay_ms == 0 && !config.dry_run {
            warnings.push(ConfigValidationWarning {
                field: "requestDelayMs".to_string(),
                message: "Requests will be sent without throttling".to_string(),
                suggestion: Some(format!(
                    "Use the default of {}ms unless the registry can absorb bursts",
                    DEFAULT_REQUEST_DELAY_MS
                )),
            });
        }

        // 6. Unexpanded environment references
        let report_path = config
            .report_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        for (field, value) in [
            ("baseUrl", config.base_url.as_str()),
            ("reportPath", report_path.as_str()),
        ] {
            for var_name in Self::unresolved_references(value) {
                warnings.push(ConfigValidationWarning {
                    field: field.to_string(),
                    message: format!(
                        "Environment variable {} is not set; '${{{}}}' is used literally",
                        var_name, var_name
                    ),
                    suggestion: Some(format!("Export {} or remove the reference", var_name)),
                });
            }
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Format validation result as human-readable string
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration validation succeeded".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
                if let (Some(expected), Some(actual)) = (&error.expected, &error.actual) {
                    lines.push(format!("    Expected: {}", expected));
                    lines.push(format!("    Actual: {}", actual));
                }
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    lines.push(format!("    Suggestion: {}", suggestion));
                }
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_env_config() {
        let mut env = HashMap::new();
        env.insert("SEEDER_BASE_URL".to_string(), "https://registry.test".to_string());
        env.insert("SEEDER_REQUEST_DELAY_MS".to_string(), "0".to_string());
        env.insert("SEEDER_LOG_FORMAT".to_string(), "json".to_string());

        let config = ConfigLoader::load_env_config(&env).unwrap();

        assert_eq!(config.base_url.as_deref(), Some("https://registry.test"));
        assert_eq!(config.request_delay_ms, Some(0));
        assert_eq!(
            config.logging,
            Some(LoggingConfig {
                level: None,
                format: Some(LogFormat::Json),
            })
        );
    }

    #[test]
    fn test_load_env_delimiter() {
        let mut env = HashMap::new();
        env.insert("SEEDER_DELIMITER".to_string(), "\\t".to_string());
        let config = ConfigLoader::load_env_config(&env).unwrap();
        assert_eq!(config.delimiter, Some('\t'));

        env.insert("SEEDER_DELIMITER".to_string(), ";".to_string());
        let config = ConfigLoader::load_env_config(&env).unwrap();
        assert_eq!(config.delimiter, Some(';'));

        env.insert("SEEDER_DELIMITER".to_string(), ";;".to_string());
        let err = ConfigLoader::load_env_config(&env).unwrap_err();
        assert!(err.to_string().contains("SEEDER_DELIMITER"));
    }

    #[test]
    fn test_load_env_config_rejects_bad_number() {
        let mut env = HashMap::new();
        env.insert("SEEDER_TIMEOUT_SECS".to_string(), "soon".to_string());

        let err = ConfigLoader::load_env_config(&env).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("SEEDER_TIMEOUT_SECS"));
    }

    #[test]
    fn test_expand_string() {
        let mut env = HashMap::new();
        env.insert("REGISTRY_HOST".to_string(), "geo.example.org".to_string());

        let result = ConfigLoader::expand_string("https://${REGISTRY_HOST}/api", &env);
        assert_eq!(result, "https://geo.example.org/api");
    }

    #[test]
    fn test_expand_string_leaves_unknown_variable() {
        let env = HashMap::new();
        let result = ConfigLoader::expand_string("https://${MISSING_HOST}/api", &env);
        assert_eq!(result, "https://${MISSING_HOST}/api");
    }

    #[tokio::test]
    async fn test_load_priority() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "baseUrl: https://from-file.test\nrequestDelayMs: 500\nrequestTimeoutSecs: 9\n",
        )
        .unwrap();

        let mut env = HashMap::new();
        env.insert("SEEDER_REQUEST_DELAY_MS".to_string(), "50".to_string());

        let options = ConfigLoadOptions {
            project_path: dir.path().to_path_buf(),
            config_path: None,
            cli_args: Some(SeederConfigFile {
                request_timeout_secs: Some(3),
                ..Default::default()
            }),
            env,
        };

        let config = ConfigLoader::load(options).await.unwrap();

        assert_eq!(config.base_url, "https://from-file.test");
        assert_eq!(config.request_delay_ms, 50);
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[tokio::test]
    async fn test_explicit_config_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let options = ConfigLoadOptions {
            project_path: dir.path().to_path_buf(),
            config_path: Some(dir.path().join("missing.yaml")),
            ..Default::default()
        };

        let err = ConfigLoader::load(options).await.unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_config_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "requestDelayMs: [oops").unwrap();

        let options = ConfigLoadOptions {
            project_path: dir.path().to_path_buf(),
            ..Default::default()
        };

        let err = ConfigLoader::load(options).await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_validate_default_config() {
        let result = ConfigLoader::validate(&SeederConfig::default());
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_url_and_timeout() {
        let config = SeederConfig {
            base_url: "ftp://registry.test".to_string(),
            request_timeout_secs: 0,
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].field, "baseUrl");
        assert_eq!(result.errors[1].field, "requestTimeoutSecs");
    }

    #[test]
    fn test_validate_zero_delay_warning() {
        let config = SeederConfig {
            request_delay_ms: 0,
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);

        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, "requestDelayMs");
    }

    #[test]
    fn test_validate_rejects_non_ascii_delimiter() {
        let config = SeederConfig {
            delimiter: '¦',
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);

        assert!(!result.valid);
        assert_eq!(result.errors[0].field, "delimiter");
    }

    #[tokio::test]
    async fn test_unknown_variable_is_reported_as_warning() {
        let dir = TempDir::new().unwrap();
        let mut env = HashMap::new();
        env.insert("REPORT_DIR".to_string(), "reports".to_string());

        let options = ConfigLoadOptions {
            project_path: dir.path().to_path_buf(),
            cli_args: Some(SeederConfigFile {
                report_path: Some(PathBuf::from("${REPORT_DIR}/${RUN_LABEL}/report.json")),
                ..Default::default()
            }),
            env,
            ..Default::default()
        };

        let config = ConfigLoader::load(options).await.unwrap();
        assert_eq!(
            config.report_path,
            Some(PathBuf::from("reports/${RUN_LABEL}/report.json"))
        );

        let result = ConfigLoader::validate(&config);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, "reportPath");
        assert!(result.warnings[0].message.contains("RUN_LABEL"));
        assert!(ConfigLoader::format_validation_result(&result).contains("RUN_LABEL"));
    }

    #[test]
    fn test_format_validation_result() {
        let result = ConfigValidationResult {
            valid: false,
            errors: vec![ConfigValidationError {
                field: "baseUrl".to_string(),
                message: "Invalid URL".to_string(),
                expected: Some("absolute URL".to_string()),
                actual: Some("registry".to_string()),
            }],
            warnings: vec![ConfigValidationWarning {
                field: "requestDelayMs".to_string(),
                message: "Requests will be sent without throttling".to_string(),
                suggestion: None,
            }],
        };

        let formatted = ConfigLoader::format_validation_result(&result);

        assert!(formatted.contains("❌ Configuration has errors"));
        assert!(formatted.contains("[baseUrl]"));
        assert!(formatted.contains("Actual: registry"));
        assert!(formatted.contains("🟡 Warnings:"));
    }
}
