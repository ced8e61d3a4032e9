use crate::core::extrapolate::{extrapolate, ExtrapolationWindow};
use crate::core::logs::format_logs;
use crate::core::table::format_table;
use crate::core::time_value::{Clock, SystemClock};
use crate::core::timeseries::{aggregate, SeriesLayout};
use crate::core::variables::variable_values;
use crate::domain::model::{LogFrame, OutputTable, ResultSet, Series, VariableOption};
use crate::utils::error::Result;

/// Per-target formatting options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub ref_id: String,
    pub time_key: String,
    pub data_keys: Vec<String>,
    pub label_keys: Vec<String>,
    pub utc: bool,
    pub window: ExtrapolationWindow,
}

/// 將逗號分隔的欄位字串拆成清單，忽略空白項目
pub fn split_keys(keys: &str) -> Vec<String> {
    keys.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shapes one result set into table, log or time-series output.
pub struct SqlSeries<'a> {
    result_set: &'a ResultSet,
    options: QueryOptions,
    layout: SeriesLayout,
    clock: Box<dyn Clock>,
}

impl<'a> SqlSeries<'a> {
    pub fn new(result_set: &'a ResultSet, options: QueryOptions) -> Self {
        let layout = SeriesLayout::resolve(
            &result_set.meta,
            result_set.data.first(),
            &options.time_key,
            &options.data_keys,
            &options.label_keys,
        );

        tracing::debug!(
            "{}: time key {:?}, data keys {:?}, label keys {:?}",
            options.ref_id,
            layout.time_key,
            layout.data_keys,
            layout.label_keys
        );

        Self {
            result_set,
            options,
            layout,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn to_table(&self) -> Vec<OutputTable> {
        format_table(&self.result_set.meta, &self.result_set.data)
    }

    pub fn to_logs(&self) -> Vec<LogFrame> {
        format_logs(&self.options.ref_id, &self.result_set.meta, &self.result_set.data)
    }

    pub fn to_time_series(&self, extrapolate_boundaries: bool) -> Result<Vec<Series>> {
        let series = aggregate(
            &self.result_set.data,
            &self.layout,
            self.options.utc,
            self.clock.as_ref(),
        )?;

        if !extrapolate_boundaries {
            return Ok(series);
        }

        Ok(series
            .into_iter()
            .map(|s| Series {
                datapoints: extrapolate(s.datapoints, &self.options.window),
                target: s.target,
            })
            .collect())
    }

    pub fn to_variables(&self, key: &str) -> Result<Vec<VariableOption>> {
        variable_values(self.result_set, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time_value::FixedClock;
    use crate::domain::model::ColumnMeta;
    use serde_json::json;

    #[test]
    fn test_split_keys() {
        assert_eq!(split_keys("cpu, mem,,  "), vec!["cpu", "mem"]);
        assert!(split_keys("").is_empty());
    }

    #[test]
    fn test_extrapolation_only_when_requested() {
        let from = 1_704_067_200;
        let rows = (0..10)
            .map(|i| {
                let value = if i == 0 { 0 } else { 10 * i };
                serde_json::from_value(json!({"t": from + 60 * i, "hits": value})).unwrap()
            })
            .collect();
        let result_set = ResultSet::new(
            vec![ColumnMeta::new("t", "DateTime"), ColumnMeta::new("hits", "UInt64")],
            rows,
        );
        let options = QueryOptions {
            ref_id: "A".to_string(),
            utc: true,
            window: ExtrapolationWindow {
                from_secs: from,
                to_secs: from + 545,
                till_now: true,
            },
            ..QueryOptions::default()
        };
        let shaper = SqlSeries::new(&result_set, options)
            .with_clock(FixedClock::from_millis((from + 600) * 1000));

        let raw = shaper.to_time_series(false).unwrap();
        assert_eq!(raw[0].datapoints[0].value, json!(0));

        let adjusted = shaper.to_time_series(true).unwrap();
        // (10 - 20) / 10 * 0.1 = -0.1
        let first = adjusted[0].datapoints[0].value.as_f64().unwrap();
        assert!((first - 9.0).abs() < 1e-9);
        // (80 - 70) / 80 * 0.1 = 0.0125
        let last = adjusted[0].datapoints[9].value.as_f64().unwrap();
        assert!((last - 81.0).abs() < 1e-9);
    }
}
