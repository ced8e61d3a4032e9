use crate::core::classifier::{classify, is_floating};
use crate::core::coerce::{as_number, coerce_number};
use crate::core::time_value::{normalize, Clock};
use crate::domain::model::{display_value, CellValue, ColumnMeta, Datapoint, FieldKind, Row, Series};
use crate::utils::error::{Result, ShapeError};
use indexmap::IndexMap;
use serde_json::Value;

const LABEL_SEPARATOR: &str = ", ";

/// 解析後的欄位角色：時間欄位、數值欄位與標籤欄位
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesLayout {
    pub time_key: Option<String>,
    pub data_keys: Vec<String>,
    pub label_keys: Vec<String>,
}

impl SeriesLayout {
    pub fn resolve(
        meta: &[ColumnMeta],
        first_row: Option<&Row>,
        time_key: &str,
        data_keys: &[String],
        label_keys: &[String],
    ) -> Self {
        let time_key = resolve_time_key(meta, first_row, time_key);
        let is_time = |col: &ColumnMeta| time_key.as_deref() == Some(col.name.as_str());

        let number_keys: Vec<String> = meta
            .iter()
            .filter(|col| classify(&col.r#type) == FieldKind::Number && !is_time(col))
            .map(|col| col.name.clone())
            .collect();
        let string_keys: Vec<&str> = meta
            .iter()
            .filter(|col| classify(&col.r#type) == FieldKind::String && !is_time(col))
            .map(|col| col.name.as_str())
            .collect();

        let selected: Vec<String> = data_keys
            .iter()
            .filter(|key| number_keys.contains(key))
            .cloned()
            .collect();
        let label_keys = label_keys
            .iter()
            .filter(|key| string_keys.contains(&key.as_str()))
            .cloned()
            .collect();

        Self {
            time_key,
            data_keys: if selected.is_empty() { number_keys } else { selected },
            label_keys,
        }
    }

    /// Series name for a scalar cell of `data_key` in `row`.
    pub fn series_key(&self, row: &Row, data_key: &str) -> String {
        let labels: Vec<String> = self
            .label_keys
            .iter()
            .filter_map(|key| row.get(key))
            .filter(|value| !value.is_null())
            .map(display_value)
            .collect();

        if labels.is_empty() {
            return data_key.to_string();
        }

        let joined = labels.join(LABEL_SEPARATOR);
        // 多個數值欄位共用同一組標籤時，加上欄位名稱以免序列名稱重複
        if self.data_keys.len() > 1 {
            format!("{} {}", joined, data_key)
        } else {
            joined
        }
    }
}

/// 時間欄位：指定值（需存在）→ 第一個時間類型欄位 → 第一列數值最大的整數欄位
pub fn resolve_time_key(meta: &[ColumnMeta], first_row: Option<&Row>, configured: &str) -> Option<String> {
    let configured = configured.trim();
    if !configured.is_empty() && meta.iter().any(|col| col.name == configured) {
        return Some(configured.to_string());
    }

    find_time_column(meta)
        .or_else(|| find_epoch_column(meta, first_row?))
        .map(|col| col.name.clone())
}

fn find_time_column(meta: &[ColumnMeta]) -> Option<&ColumnMeta> {
    meta.iter()
        .filter(|col| !is_floating(&col.r#type))
        .find(|col| classify(&col.r#type) == FieldKind::Time)
}

/// The integer column with the largest first-row value looks like an epoch counter.
fn find_epoch_column<'a>(meta: &'a [ColumnMeta], first_row: &Row) -> Option<&'a ColumnMeta> {
    let value_of = |col: &ColumnMeta| first_row.get(&col.name).and_then(as_number);

    let mut candidates = meta
        .iter()
        .filter(|col| !is_floating(&col.r#type))
        .filter(|col| classify(&col.r#type) == FieldKind::Number);

    let mut best = candidates.next()?;
    for col in candidates {
        if let (Some(current), Some(candidate)) = (value_of(best), value_of(col)) {
            if current < candidate {
                best = col;
            }
        }
    }
    Some(best)
}

#[derive(Debug, Default)]
struct SeriesStore {
    series: IndexMap<String, Vec<Datapoint>>,
}

impl SeriesStore {
    /// 時間前進時，為在 `frontier` 沒有值的序列補上空值
    fn mark_gaps_at(&mut self, frontier: f64) {
        for points in self.series.values_mut() {
            if points.last().is_some_and(|p| p.timestamp_ms < frontier) {
                points.push(Datapoint::gap(frontier));
            }
        }
    }

    /// Distinct, ascending timestamps already seen that are older than `timestamp`.
    fn gap_history(&self, timestamp: f64) -> Vec<Datapoint> {
        let mut seen: Vec<f64> = self
            .series
            .values()
            .flatten()
            .map(|p| p.timestamp_ms)
            .filter(|ts| ts.is_finite() && *ts < timestamp)
            .collect();
        seen.sort_by(f64::total_cmp);
        seen.dedup();
        seen.into_iter().map(Datapoint::gap).collect()
    }

    fn push(&mut self, key: String, timestamp: f64, value: Value) {
        let points = match self.series.get_index_of(&key) {
            Some(index) => &mut self.series[index],
            None => {
                let history = self.gap_history(timestamp);
                self.series.entry(key).or_insert(history)
            }
        };
        points.push(Datapoint::new(value, timestamp));
    }

    fn into_series(self) -> Vec<Series> {
        self.series
            .into_iter()
            .map(|(target, datapoints)| Series { target, datapoints })
            .collect()
    }
}

/// 依列順序（時間遞增）拆成序列；某序列在其他序列有值的時間點缺值時補 `(null, t)`
pub fn aggregate(rows: &[Row], layout: &SeriesLayout, utc: bool, clock: &dyn Clock) -> Result<Vec<Series>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let time_key = layout.time_key.as_deref().ok_or(ShapeError::NoTimeColumn)?;
    let time_of = |row: &Row| normalize(row.get(time_key).unwrap_or(&Value::Null), utc, clock);

    let mut store = SeriesStore::default();
    let mut frontier = time_of(&rows[0]);

    for row in rows {
        let t = time_of(row);

        if frontier.is_nan() || frontier < t {
            store.mark_gaps_at(frontier);
            frontier = t;
        }

        for data_key in &layout.data_keys {
            let Some(raw) = row.get(data_key) else {
                continue;
            };

            match CellValue::from_json(raw) {
                CellValue::Pivoted(pairs) => {
                    for (sub_key, value) in pairs {
                        store.push(sub_key, t, coerce_number(&value));
                    }
                }
                CellValue::Scalar(value) => {
                    store.push(layout.series_key(row, data_key), t, coerce_number(&value));
                }
            }
        }
    }

    // 最後一個時間點也要補齊
    store.mark_gaps_at(frontier);

    let series = store.into_series();
    tracing::debug!(
        "Aggregated {} rows into {} series on time column '{}'",
        rows.len(),
        series.len(),
        time_key
    );
    Ok(series)
}
