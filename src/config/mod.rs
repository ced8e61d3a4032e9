#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::toml_config::TomlConfig;
#[cfg(feature = "cli")]
use crate::domain::model::{OutputFormat, QueryTarget, RequestOptions};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::validate_required_field;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "sql-series")]
#[command(about = "Shape columnar query results into table, log and time-series frames")]
pub struct CliConfig {
    /// Path to a TOML file describing the request and its targets
    #[arg(short, long)]
    pub config: Option<String>,

    /// Query result (JSON with `meta` and `data`) for a single target
    #[arg(short, long)]
    pub input: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long, default_value = "timeseries")]
    pub format: OutputFormat,

    #[arg(long, default_value = "A")]
    pub ref_id: String,

    #[arg(long, default_value = "")]
    pub time_key: String,

    /// Comma separated value columns
    #[arg(long, default_value = "")]
    pub data_keys: String,

    /// Comma separated label columns
    #[arg(long, default_value = "")]
    pub label_keys: String,

    #[arg(long, default_value = "")]
    pub variable_key: String,

    /// Window start, epoch seconds
    #[arg(long, default_value = "0")]
    pub from: i64,

    /// Window end, epoch seconds
    #[arg(long, default_value = "0")]
    pub to: i64,

    #[arg(long, help = "The window ends at now")]
    pub till_now: bool,

    #[arg(long, help = "Interpret naive timestamps as UTC")]
    pub utc: bool,

    #[arg(long, help = "Disable boundary extrapolation")]
    pub no_extrapolate: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 命令列模式與 TOML 模式統一成 `TomlConfig`
    pub fn resolve(&self) -> Result<TomlConfig> {
        if let Some(path) = &self.config {
            let mut config = TomlConfig::from_file(path)?;
            if let Some(output_path) = &self.output_path {
                config.load.output_path = output_path.clone();
            }
            return Ok(config);
        }

        let input = validate_required_field("input", &self.input)?;
        let target = QueryTarget {
            ref_id: self.ref_id.clone(),
            format: self.format,
            input: input.clone(),
            time_key: self.time_key.clone(),
            data_keys: self.data_keys.clone(),
            label_keys: self.label_keys.clone(),
            variable_key: self.variable_key.clone(),
            extrapolate: !self.no_extrapolate,
            hide: false,
        };
        let request = RequestOptions {
            from: self.from,
            to: self.to,
            till_now: self.till_now,
            utc: self.utc,
        };

        Ok(TomlConfig::single_target(
            target,
            request,
            self.output_path
                .clone()
                .unwrap_or_else(|| "./output".to_string()),
        ))
    }
}
