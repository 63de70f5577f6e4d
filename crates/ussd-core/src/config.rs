//! Configuration system for the USSD menu engine.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ussd.toml";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Inbound request settings
    pub input: InputConfig,
    /// Response rendering settings
    pub output: OutputConfig,
    /// Back/next navigation settings
    pub navigation: NavigationConfig,
    /// Session cache settings
    pub session: SessionConfig,
    /// Handler dispatch settings
    pub handlers: HandlersConfig,
    /// Generic error response
    pub errors: ErrorsConfig,
}

/// Deployment environment, controls how internal errors are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

/// Default wire format when no adaptor is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text prefixed with `CON `/`END `
    Conend,
    /// `{response_string, action}` envelope
    Json,
}

impl OutputFormat {
    /// Adaptor profile implementing this format.
    pub fn adaptor_name(&self) -> &'static str {
        match self {
            OutputFormat::Conend => "conend",
            OutputFormat::Json => "json",
        }
    }
}

/// Key-value backend holding session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// development or production
    pub environment: Environment,
    /// Path to the JSON menu document
    pub menu_file: PathBuf,
    /// Root menu key
    pub default_menu: String,
    /// Strip `+` from phone numbers
    #[serde(alias = "sanitizePhoneNumber")]
    pub sanitize_phone_number: bool,
    /// Treat a node's options map as the next node on unmatched input
    pub legacy_options_fallback: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            menu_file: PathBuf::from("menu.json"),
            default_menu: "default_menu".to_string(),
            sanitize_phone_number: true,
            legacy_options_fallback: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// `chained` splits input on `*` and keeps the last segment
    pub input_format: String,
    /// Field names of the default inbound shape
    pub request_variables: RequestVariables,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input_format: "chained".to_string(),
            request_variables: RequestVariables::default(),
        }
    }
}

/// Inbound field names for the canonical request fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestVariables {
    pub session_id: String,
    pub service_code: String,
    pub phone_number: String,
    pub request_string: String,
}

impl Default for RequestVariables {
    fn default() -> Self {
        Self {
            session_id: "sessionId".to_string(),
            service_code: "serviceCode".to_string(),
            phone_number: "phoneNumber".to_string(),
            request_string: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Fallback wire format
    pub output_format: OutputFormat,
    /// Gateway profile, overrides `output_format`
    pub adaptor: Option<String>,
    /// Maximum characters per rendered line
    pub chars_per_line: Option<usize>,
    /// Separator between items of a display string
    pub menu_items_separator: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Conend,
            adaptor: None,
            chars_per_line: None,
            menu_items_separator: "|".to_string(),
        }
    }
}

impl OutputConfig {
    /// Name of the adaptor profile in effect.
    pub fn adaptor_name(&self) -> &str {
        self.adaptor
            .as_deref()
            .unwrap_or_else(|| self.output_format.adaptor_name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Interpret nav sentinels and render Back/Next items
    #[serde(alias = "enable_back_and_forth_menu_nav")]
    pub enabled: bool,
    /// Input that advances to the next page
    pub nav_next: String,
    /// Input that goes back one level
    pub nav_prev: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nav_next: "0".to_string(),
            nav_prev: "00".to_string(),
        }
    }
}

impl NavigationConfig {
    /// Label of the synthetic next-page item.
    pub fn next_label(&self) -> String {
        format!("{}. Next", self.nav_next)
    }

    /// Label of the synthetic back item.
    pub fn back_label(&self) -> String {
        format!("{}. Back", self.nav_prev)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sliding expiry of session keys
    pub ttl_secs: u64,
    /// Store backend
    pub backend: StoreBackend,
    /// SQLite database path
    pub path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 20,
            backend: StoreBackend::Memory,
            path: None,
        }
    }
}

impl SessionConfig {
    /// Database path for the SQLite backend.
    pub fn sqlite_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("sessions.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlersConfig {
    /// Methods that must not be invoked
    pub disabled_func: BTreeSet<String>,
    /// Fail engine construction on handler names missing from the registry
    pub strict: bool,
}

impl Default for HandlersConfig {
    fn default() -> Self {
        Self {
            disabled_func: BTreeSet::new(),
            strict: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorsConfig {
    pub error_title: String,
    pub error_message: String,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            error_title: "Error Occurred".to_string(),
            error_message: "Something went wrong. Please try again later".to_string(),
        }
    }
}

/// Validation result with multiple issues.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation issues
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a new empty validation result.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Check if validation passed (no errors).
    pub fn is_ok(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == IssueSeverity::Error)
    }

    /// Get only error-level issues.
    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
            .collect()
    }

    /// Get only warning-level issues.
    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
            .collect()
    }

    /// Add an error.
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Error,
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning.
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Warning,
            field: field.into(),
            message: message.into(),
        });
    }
}

/// A single validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// Field path (e.g., "output.chars_per_line")
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Warnings don't prevent loading
    Warning,
    /// Errors prevent loading
    Error,
}

impl Config {
    fn figment(file: Figment) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(file)
            .merge(Env::prefixed("USSD_").split("__"))
    }

    /// Load configuration from defaults, a TOML file and `USSD_*` variables.
    ///
    /// Without an explicit path, `ussd.toml` in the working directory is
    /// used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::figment(Figment::from(Toml::file(file))).extract()
    }

    /// Load and validate configuration.
    pub fn load_validated(path: Option<&Path>) -> Result<Self, Error> {
        let config = Self::load(path).map_err(|e| Error::ConfigInvalid(e.to_string()))?;
        config.into_validated()
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self, Error> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml))
            .extract()
            .map_err(|e| Error::ConfigInvalid(e.to_string()))?;
        config.into_validated()
    }

    fn into_validated(self) -> Result<Self, Error> {
        self.ensure_valid()?;
        Ok(self)
    }

    /// Fail with `ConfigInvalid` listing every validation error; log warnings.
    pub fn ensure_valid(&self) -> Result<(), Error> {
        let result = self.validate();

        if !result.is_ok() {
            let errors: Vec<String> = result
                .errors()
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            return Err(Error::ConfigInvalid(format!(
                "Configuration validation failed:\n  {}",
                errors.join("\n  ")
            )));
        }

        for warning in result.warnings() {
            tracing::warn!("Config warning - {}: {}", warning.field, warning.message);
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if self.general.menu_file.as_os_str().is_empty() {
            result.add_error("general.menu_file", "menu_file cannot be empty");
        }

        if self.general.default_menu.is_empty() {
            result.add_error("general.default_menu", "default_menu cannot be empty");
        }

        let valid_separators = ["|", ","];
        if !valid_separators.contains(&self.output.menu_items_separator.as_str()) {
            result.add_error(
                "output.menu_items_separator",
                format!(
                    "Invalid separator '{}'. Valid values: {:?}",
                    self.output.menu_items_separator, valid_separators
                ),
            );
        }

        if self.output.chars_per_line == Some(0) {
            result.add_error(
                "output.chars_per_line",
                "chars_per_line must be a positive integer",
            );
        }

        if let Some(ref adaptor) = self.output.adaptor {
            if adaptor.trim().is_empty() {
                result.add_error("output.adaptor", "adaptor name cannot be empty");
            }
        }

        if self.navigation.nav_next.is_empty() {
            result.add_error("navigation.nav_next", "nav_next cannot be empty");
        }

        if self.navigation.nav_prev.is_empty() {
            result.add_error("navigation.nav_prev", "nav_prev cannot be empty");
        }

        if self.navigation.nav_next == self.navigation.nav_prev {
            result.add_error(
                "navigation.nav_prev",
                "nav_next and nav_prev must be different",
            );
        }

        if self.input.input_format != "chained"
            && (self.navigation.nav_next.contains('*') || self.navigation.nav_prev.contains('*'))
        {
            result.add_warning(
                "navigation",
                "sentinels containing '*' only match in non-chained input",
            );
        }

        let vars = &self.input.request_variables;
        for (field, value) in [
            ("session_id", &vars.session_id),
            ("service_code", &vars.service_code),
            ("phone_number", &vars.phone_number),
            ("request_string", &vars.request_string),
        ] {
            if value.is_empty() {
                result.add_error(
                    format!("input.request_variables.{}", field),
                    "field name cannot be empty",
                );
            }
        }

        if self.session.ttl_secs == 0 {
            result.add_error("session.ttl_secs", "ttl_secs must be greater than 0");
        }

        if self.session.ttl_secs > 300 {
            result.add_warning(
                "session.ttl_secs",
                "ttl_secs is very high (> 300s), abandoned sessions will linger",
            );
        }

        if self.session.backend == StoreBackend::Sqlite && self.session.path.is_none() {
            result.add_warning(
                "session.path",
                format!(
                    "No path for sqlite backend, using {:?}",
                    self.session.sqlite_path()
                ),
            );
        }

        result
    }

    /// Whether inbound input is `*`-chained.
    pub fn chained_input(&self) -> bool {
        self.input.input_format == "chained"
    }

    /// Whether internal errors are surfaced in responses.
    pub fn is_development(&self) -> bool {
        self.general.environment == Environment::Development
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::ConfigInvalid(e.to_string()))
    }

    /// Get the data directory (for the SQLite session store).
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join("ussd"))
            .unwrap_or_else(|| PathBuf::from(".ussd"))
    }
}
