use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// 上游回應中描述單一欄位的 metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub r#type: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            r#type: r#type.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    pub data: HashMap<String, Value>,
}

impl Row {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// 上游查詢結果 (`meta` + `data`)，欄位名稱與 JSON 回應一致
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub meta: Vec<ColumnMeta>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_before_limit_at_least: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Row>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Row>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResultSet {
    pub fn new(meta: Vec<ColumnMeta>, data: Vec<Row>) -> Self {
        Self {
            meta,
            data,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.meta.iter().any(|col| col.name == name)
    }

    /// 上游回報的錯誤訊息（空字串視為沒有錯誤）
    pub fn upstream_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// 欄位的語意類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    String,
    Time,
    Other,
}

/// 表格輸出的欄位類型，只區分數字與字串
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableColumnType {
    Number,
    String,
}

/// A single cell, either a plain value or pre-pivoted `[subKey, value]` pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Scalar(Value),
    Pivoted(Vec<(String, Value)>),
}

impl CellValue {
    pub fn from_json(value: &Value) -> Self {
        if let Value::Array(items) = value {
            let pairs: Option<Vec<(String, Value)>> = items
                .iter()
                .map(|item| match item {
                    Value::Array(pair) if pair.len() == 2 => {
                        Some((display_value(&pair[0]), pair[1].clone()))
                    }
                    _ => None,
                })
                .collect();

            if let Some(pairs) = pairs {
                return CellValue::Pivoted(pairs);
            }
        }

        CellValue::Scalar(value.clone())
    }
}

/// 將 JSON 值轉為顯示用字串：字串原樣輸出，其他值使用 JSON 表示
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `(value, timestamp)`; a null value is a gap marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    pub value: Value,
    pub timestamp_ms: f64,
}

impl Datapoint {
    pub fn new(value: Value, timestamp_ms: f64) -> Self {
        Self {
            value,
            timestamp_ms,
        }
    }

    pub fn gap(timestamp_ms: f64) -> Self {
        Self::new(Value::Null, timestamp_ms)
    }

    pub fn is_gap(&self) -> bool {
        self.value.is_null()
    }
}

impl Serialize for Datapoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.value)?;
        if self.timestamp_ms.is_finite() {
            tuple.serialize_element(&(self.timestamp_ms as i64))?;
        } else {
            tuple.serialize_element(&Option::<i64>::None)?;
        }
        tuple.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    pub text: String,
    pub r#type: TableColumnType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputTable {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageField {
    pub name: String,
    pub value: Value,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogField {
    pub name: String,
    pub value: Value,
    pub r#type: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFrame {
    pub ref_id: String,
    pub preferred_visualisation_type: &'static str,
    pub message_field: MessageField,
    pub other_fields: Vec<LogField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub target: String,
    pub datapoints: Vec<Datapoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableOption {
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Logs,
    #[default]
    TimeSeries,
    Variables,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "logs" => Ok(OutputFormat::Logs),
            "timeseries" | "time_series" => Ok(OutputFormat::TimeSeries),
            "variables" => Ok(OutputFormat::Variables),
            other => Err(format!(
                "unsupported format '{}', expected one of: table, logs, timeseries, variables",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Table => "table",
            OutputFormat::Logs => "logs",
            OutputFormat::TimeSeries => "timeseries",
            OutputFormat::Variables => "variables",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "frames", rename_all = "lowercase")]
pub enum ShapedOutput {
    Table(Vec<OutputTable>),
    Logs(Vec<LogFrame>),
    TimeSeries(Vec<Series>),
    Variables(Vec<VariableOption>),
}

impl ShapedOutput {
    pub fn len(&self) -> usize {
        match self {
            ShapedOutput::Table(frames) => frames.len(),
            ShapedOutput::Logs(frames) => frames.len(),
            ShapedOutput::TimeSeries(frames) => frames.len(),
            ShapedOutput::Variables(frames) => frames.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 查詢視窗與時區設定，每次請求共用
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// epoch seconds
    #[serde(default)]
    pub from: i64,
    #[serde(default)]
    pub to: i64,
    #[serde(default)]
    pub till_now: bool,
    #[serde(default)]
    pub utc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTarget {
    pub ref_id: String,
    #[serde(default)]
    pub format: OutputFormat,
    /// 結果檔案路徑 (JSON)
    pub input: String,
    #[serde(default)]
    pub time_key: String,
    /// 逗號分隔的欄位清單
    #[serde(default)]
    pub data_keys: String,
    #[serde(default)]
    pub label_keys: String,
    #[serde(default)]
    pub variable_key: String,
    #[serde(default = "default_extrapolate")]
    pub extrapolate: bool,
    #[serde(default)]
    pub hide: bool,
}

fn default_extrapolate() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResponse {
    pub ref_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ShapedOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetResponse {
    pub fn ok(ref_id: impl Into<String>, data: ShapedOutput) -> Self {
        Self {
            ref_id: ref_id.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(ref_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformResult {
    pub responses: Vec<TargetResponse>,
}
