//! Settings for pdftrans, read from `config.toml`.
//!
//! Layering follows file → environment → CLI: the file supplies defaults,
//! `PDFTRANS_CMD` / `PDFTRANS_SERVICE` override it, and command-line flags
//! win over both (applied by the `translate` command).
//!
//! # Configuration File Format
//!
//! ```toml
//! [translator]
//! command = "pdf2zh"
//! args = ["{input}", "-li", "{lang_in}", "-lo", "{lang_out}", "-s", "{service}", "-o", "{output_dir}"]
//! service = "google"
//! lang_in = "en"
//! lang_out = "zh"
//! # output_dir = "/path/to/translated"
//!
//! [output]
//! success_phrase = "Translation completed"
//! noise_markers = ["NotOpenSSLWarning"]
//! split_carriage_returns = false
//!
//! [logging]
//! level = "info"
//! # dir = "/path/to/logs"
//! ```

use crate::errors::ConfigError;
use crate::progress::{DEFAULT_NOISE_MARKERS, DEFAULT_SUCCESS_PHRASE, DisplayRules};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "PDFTRANS_CONFIG";

/// How to invoke the external translation tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatorSection {
    #[serde(default = "default_command")]
    pub command: String,
    /// Argument template; see [`crate::translator::expand_args`] for placeholders
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default = "default_lang_in")]
    pub lang_in: String,
    #[serde(default = "default_lang_out")]
    pub lang_out: String,
    /// Where translated PDFs land; defaults to the input's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_command() -> String {
    "pdf2zh".to_string()
}

fn default_args() -> Vec<String> {
    [
        "{input}",
        "-li",
        "{lang_in}",
        "-lo",
        "{lang_out}",
        "-s",
        "{service}",
        "-o",
        "{output_dir}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_service() -> String {
    "google".to_string()
}

fn default_lang_in() -> String {
    "en".to_string()
}

fn default_lang_out() -> String {
    "zh".to_string()
}

impl Default for TranslatorSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            service: default_service(),
            lang_in: default_lang_in(),
            lang_out: default_lang_out(),
            output_dir: None,
        }
    }
}

/// How translator output is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_success_phrase")]
    pub success_phrase: String,
    #[serde(default = "default_noise_markers")]
    pub noise_markers: Vec<String>,
    #[serde(default)]
    pub split_carriage_returns: bool,
}

fn default_success_phrase() -> String {
    DEFAULT_SUCCESS_PHRASE.to_string()
}

fn default_noise_markers() -> Vec<String> {
    DEFAULT_NOISE_MARKERS.iter().map(|s| s.to_string()).collect()
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            success_phrase: default_success_phrase(),
            noise_markers: default_noise_markers(),
            split_carriage_returns: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Default filter when `PDFTRANS_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for daily-rotated log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

/// Complete settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub translator: TranslatorSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse settings from a TOML string.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load settings, returning defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to a TOML file, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            field: "settings".to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)
    }

    /// `<config_dir>/pdftrans/config.toml`, or `./pdftrans.toml` when the
    /// platform has no config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("pdftrans").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("pdftrans.toml"))
    }

    /// Resolve the config path: explicit flag, then `PDFTRANS_CONFIG`, then default.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path)
    }

    /// Translator command, with `PDFTRANS_CMD` taking precedence.
    pub fn command(&self) -> String {
        std::env::var("PDFTRANS_CMD")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.translator.command.clone())
    }

    /// Translation service, with `PDFTRANS_SERVICE` taking precedence.
    pub fn service(&self) -> String {
        std::env::var("PDFTRANS_SERVICE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.translator.service.clone())
    }

    pub fn display_rules(&self) -> DisplayRules {
        DisplayRules {
            success_phrase: self.output.success_phrase.clone(),
            noise_markers: self.output.noise_markers.clone(),
        }
    }

    /// Reject settings that cannot launch a job.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.command().trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "translator.command".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Validate the settings and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.translator.args.iter().any(|a| a.contains("{input}")) {
            warnings.push(
                "translator.args has no {input} placeholder; the PDF path will not be passed"
                    .to_string(),
            );
        }
        if self.output.success_phrase.trim().is_empty() {
            warnings.push(
                "output.success_phrase is empty; success is only detected from the exit code"
                    .to_string(),
            );
        }
        if self.logging.level.parse::<tracing_subscriber::filter::EnvFilter>().is_err() {
            warnings.push(format!(
                "Invalid logging.level '{}': expected a tracing filter such as 'info' or 'pdftrans=debug'",
                self.logging.level
            ));
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_target_pdf2zh() {
        let settings = Settings::default();
        assert_eq!(settings.translator.command, "pdf2zh");
        assert_eq!(settings.translator.args[0], "{input}");
        assert_eq!(settings.output.success_phrase, DEFAULT_SUCCESS_PHRASE);
        assert!(!settings.output.split_carriage_returns);
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let settings = Settings::parse(
            r#"
            [translator]
            service = "deepl"

            [output]
            split_carriage_returns = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.translator.service, "deepl");
        assert_eq!(settings.translator.command, "pdf2zh");
        assert!(settings.output.split_carriage_returns);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_parse_invalid_toml_is_error() {
        assert!(Settings::parse("[translator\ncommand = ").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_reports_parse_error_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output = 3\n[output]").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut settings = Settings::default();
        settings.translator.lang_out = "ja".to_string();
        settings.translator.output_dir = Some(PathBuf::from("/tmp/out"));
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        let explicit = PathBuf::from("/somewhere/custom.toml");
        assert_eq!(Settings::resolve_path(Some(&explicit)), explicit);
    }

    #[test]
    fn test_check_rejects_empty_command() {
        let mut settings = Settings::default();
        settings.translator.command = "  ".to_string();
        assert!(matches!(
            settings.check(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_warns_without_input_placeholder() {
        let mut settings = Settings::default();
        settings.translator.args = vec!["--help".to_string()];
        settings.output.success_phrase = String::new();
        let warnings = settings.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("{input}"));
    }

    #[test]
    fn test_display_rules_follow_output_section() {
        let mut settings = Settings::default();
        settings.output.success_phrase = "Done!".to_string();
        settings.output.noise_markers = vec!["FutureWarning".to_string()];
        let rules = settings.display_rules();
        assert!(rules.is_success("Done!"));
        assert!(rules.is_noise("FutureWarning: foo"));
    }
}
