pub mod classifier;
pub mod coerce;
pub mod etl;
pub mod extrapolate;
pub mod logs;
pub mod pipeline;
pub mod shaper;
pub mod table;
pub mod time_value;
pub mod timeseries;
pub mod variables;

pub use crate::domain::model::{ResultSet, Row, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, TargetInput};
pub use crate::utils::error::Result;
