pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use config::toml_config::TomlConfig;
pub use core::{etl::ShapeEngine, pipeline::FilePipeline, shaper::SqlSeries};
pub use utils::error::{Result, ShapeError};
