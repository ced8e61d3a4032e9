use crate::core::ConfigProvider;
use crate::domain::model::{OutputFormat, QueryTarget, RequestOptions};
use crate::utils::error::{Result, ShapeError};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_unique,
    validate_window, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub request: RequestOptions,
    #[serde(default)]
    pub load: LoadConfig,
    pub targets: Vec<QueryTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
        }
    }
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ShapeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ShapeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FROM})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 單一目標的配置（命令列模式）
    pub fn single_target(target: QueryTarget, request: RequestOptions, output_path: String) -> Self {
        Self {
            request,
            load: LoadConfig { output_path },
            targets: vec![target],
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("load.output_path", &self.load.output_path)?;
        validate_window("request", self.request.from, self.request.to)?;

        if self.targets.is_empty() {
            return Err(ShapeError::MissingConfigError {
                field: "targets".to_string(),
            });
        }

        for target in &self.targets {
            validate_non_empty_string("targets.ref_id", &target.ref_id)?;
            validate_path("targets.input", &target.input)?;
            if target.format == OutputFormat::Variables {
                validate_non_empty_string("targets.variable_key", &target.variable_key)?;
            }
        }

        let inputs: Vec<&str> = self.targets.iter().map(|t| t.input.as_str()).collect();
        validate_file_extensions("targets.input", &inputs, &["json"])?;
        validate_unique("targets.ref_id", self.targets.iter().map(|t| t.ref_id.as_str()))?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn request(&self) -> &RequestOptions {
        &self.request
    }

    fn targets(&self) -> &[QueryTarget] {
        &self.targets
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
