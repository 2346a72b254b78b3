use crate::core::guardrail::{
    CodePrefixGuardrail, GuardrailChain, KeywordGuardrail, DEFAULT_BLOCKED_KEYWORDS,
    DEFAULT_BLOCKED_PREFIXES, DEFAULT_CODE_REPLIES, DEFAULT_KEYWORD_REPLIES, VALIDATION_TOOL,
};
use crate::core::loader::{DuplicatePolicy, TableSource, DEFAULT_CODE_COLUMN, DEFAULT_DESCRIPTION_COLUMN};
use crate::utils::error::{HsnError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Longest accepted reload interval (one day).
const MAX_RELOAD_INTERVAL_SECONDS: u64 = 86_400;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub guardrails: GuardrailConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub path: String,
    #[serde(default = "default_code_column")]
    pub code_column: String,
    #[serde(default = "default_description_column")]
    pub description_column: String,
    pub delimiter: Option<String>,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_blocked_keywords")]
    pub blocked_keywords: Vec<String>,
    #[serde(default = "default_blocked_prefixes")]
    pub blocked_prefixes: Vec<String>,
    #[serde(default = "default_keyword_replies")]
    pub keyword_replies: Vec<String>,
    #[serde(default = "default_code_replies")]
    pub code_replies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// 0 disables periodic reloads.
    #[serde(default)]
    pub reload_interval_seconds: u64,
    #[serde(default = "default_true")]
    pub audit: bool,
}

fn default_true() -> bool {
    true
}

fn default_code_column() -> String {
    DEFAULT_CODE_COLUMN.to_string()
}

fn default_description_column() -> String {
    DEFAULT_DESCRIPTION_COLUMN.to_string()
}

fn default_blocked_keywords() -> Vec<String> {
    DEFAULT_BLOCKED_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

fn default_blocked_prefixes() -> Vec<String> {
    DEFAULT_BLOCKED_PREFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_keyword_replies() -> Vec<String> {
    DEFAULT_KEYWORD_REPLIES.iter().map(|s| s.to_string()).collect()
}

fn default_code_replies() -> Vec<String> {
    DEFAULT_CODE_REPLIES.iter().map(|s| s.to_string()).collect()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: "HSN_SAC.csv".to_string(),
            code_column: default_code_column(),
            description_column: default_description_column(),
            delimiter: None,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blocked_keywords: default_blocked_keywords(),
            blocked_prefixes: default_blocked_prefixes(),
            keyword_replies: default_keyword_replies(),
            code_replies: default_code_replies(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            reload_interval_seconds: 0,
            audit: true,
        }
    }
}

impl TomlConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HsnError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replace `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| HsnError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("data.path", &self.data.path)?;
        validation::validate_file_extension("data.path", &self.data.path, &["csv", "tsv", "txt"])?;
        validation::validate_non_empty_string("data.code_column", &self.data.code_column)?;
        validation::validate_non_empty_string(
            "data.description_column",
            &self.data.description_column,
        )?;

        if self.data.code_column.trim() == self.data.description_column.trim() {
            return Err(HsnError::ConfigValidationError {
                field: "data.description_column".to_string(),
                message: "code and description columns must differ".to_string(),
            });
        }

        if let Some(delimiter) = &self.data.delimiter {
            validation::validate_delimiter("data.delimiter", delimiter)?;
        }

        if self.guardrails.enabled {
            for prefix in &self.guardrails.blocked_prefixes {
                if !prefix.trim().bytes().all(|b| b.is_ascii_digit()) {
                    return Err(HsnError::InvalidConfigValueError {
                        field: "guardrails.blocked_prefixes".to_string(),
                        value: prefix.clone(),
                        reason: "Prefixes must contain digits only".to_string(),
                    });
                }
            }
        }

        validation::validate_range(
            "service.reload_interval_seconds",
            self.service.reload_interval_seconds,
            0,
            MAX_RELOAD_INTERVAL_SECONDS,
        )?;

        Ok(())
    }

    pub fn table_source(&self) -> Result<TableSource> {
        let mut source = TableSource::new(&self.data.path)
            .with_columns(
                self.data.code_column.trim(),
                self.data.description_column.trim(),
            )
            .with_duplicate_policy(self.data.duplicate_policy);

        if let Some(delimiter) = &self.data.delimiter {
            source = source.with_delimiter(validation::validate_delimiter("data.delimiter", delimiter)?);
        }

        Ok(source)
    }

    /// Message screening runs before tool-call screening.
    pub fn guardrail_chain(&self) -> GuardrailChain {
        let settings = &self.guardrails;
        if !settings.enabled {
            return GuardrailChain::new();
        }

        let mut chain = GuardrailChain::new();
        if !settings.blocked_keywords.is_empty() {
            chain.push(Box::new(KeywordGuardrail::new(
                &settings.blocked_keywords,
                settings.keyword_replies.clone(),
            )));
        }
        if !settings.blocked_prefixes.is_empty() {
            chain.push(Box::new(CodePrefixGuardrail::new(
                VALIDATION_TOOL,
                &settings.blocked_prefixes,
                settings.code_replies.clone(),
            )));
        }
        chain
    }

    pub fn reload_interval(&self) -> Option<Duration> {
        match self.service.reload_interval_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
