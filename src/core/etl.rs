use crate::core::extrapolate::ExtrapolationWindow;
use crate::core::shaper::{split_keys, QueryOptions, SqlSeries};
use crate::core::time_value::Clock;
use crate::core::Pipeline;
use crate::domain::model::{
    OutputFormat, QueryTarget, RequestOptions, ResultSet, ShapedOutput, TargetResponse,
};
use crate::utils::error::{Result, ShapeError};
use std::time::Instant;

pub struct ShapeEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ShapeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting result shaping...");

        // Extract
        let inputs = self.pipeline.extract().await?;
        tracing::info!("Loaded {} query targets", inputs.len());

        // Transform
        let result = self.pipeline.transform(inputs).await?;
        let failed = result.responses.iter().filter(|r| r.error.is_some()).count();
        tracing::info!(
            "Shaped {} targets ({} failed)",
            result.responses.len(),
            failed
        );

        // Load
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {} ({:?})", output_path, started.elapsed());

        Ok(output_path)
    }
}

pub fn query_options(target: &QueryTarget, request: &RequestOptions) -> QueryOptions {
    QueryOptions {
        ref_id: target.ref_id.clone(),
        time_key: target.time_key.trim().to_string(),
        data_keys: split_keys(&target.data_keys),
        label_keys: split_keys(&target.label_keys),
        utc: request.utc,
        window: ExtrapolationWindow {
            from_secs: request.from,
            to_secs: request.to,
            till_now: request.till_now,
        },
    }
}

/// Shapes one target; failures stay on that target's response.
pub fn shape_target(
    target: &QueryTarget,
    result_set: &ResultSet,
    request: &RequestOptions,
    clock: impl Clock + 'static,
) -> TargetResponse {
    match try_shape_target(target, result_set, request, clock) {
        Ok(output) => {
            tracing::debug!("{}: produced {} {} frames", target.ref_id, output.len(), target.format);
            TargetResponse::ok(&target.ref_id, output)
        }
        Err(e) => {
            tracing::warn!("{}: {}", target.ref_id, e);
            TargetResponse::failed(&target.ref_id, e.to_string())
        }
    }
}

fn try_shape_target(
    target: &QueryTarget,
    result_set: &ResultSet,
    request: &RequestOptions,
    clock: impl Clock + 'static,
) -> Result<ShapedOutput> {
    if let Some(message) = result_set.upstream_error() {
        return Err(ShapeError::UpstreamError {
            message: message.to_string(),
        });
    }

    let shaper = SqlSeries::new(result_set, query_options(target, request)).with_clock(clock);

    Ok(match target.format {
        OutputFormat::Table => ShapedOutput::Table(shaper.to_table()),
        OutputFormat::Logs => ShapedOutput::Logs(shaper.to_logs()),
        OutputFormat::TimeSeries => {
            ShapedOutput::TimeSeries(shaper.to_time_series(target.extrapolate)?)
        }
        OutputFormat::Variables => ShapedOutput::Variables(shaper.to_variables(&target.variable_key)?),
    })
}
