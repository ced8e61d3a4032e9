use crate::core::classifier::js_type;
use crate::core::coerce::coerce_number;
use crate::domain::model::{display_value, ColumnMeta, OutputTable, Row, TableColumn, TableColumnType};
use crate::utils::error::{Result, ShapeError};
use serde_json::Value;

/// 產生單一表格；沒有資料列時回傳空陣列
pub fn format_table(meta: &[ColumnMeta], rows: &[Row]) -> Vec<OutputTable> {
    if rows.is_empty() {
        return Vec::new();
    }

    let columns: Vec<TableColumn> = meta
        .iter()
        .map(|col| TableColumn {
            text: col.name.clone(),
            r#type: js_type(&col.r#type),
        })
        .collect();

    let rows = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| format_cell(row.get(&col.text), col.r#type))
                .collect()
        })
        .collect();

    vec![OutputTable { columns, rows }]
}

fn format_cell(value: Option<&Value>, column_type: TableColumnType) -> Value {
    let value = value.unwrap_or(&Value::Null);
    match column_type {
        TableColumnType::Number => coerce_number(value),
        TableColumnType::String => value.clone(),
    }
}

impl OutputTable {
    /// Renders the table as CSV with a header row; null cells are empty.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.columns.iter().map(|col| col.text.as_str()))?;

        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| match cell {
                Value::Null => String::new(),
                other => display_value(other),
            }))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ShapeError::IoError(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
