use crate::core::classifier::{classify, is_uint64};
use crate::core::coerce::coerce_number;
use crate::domain::model::{
    display_value, ColumnMeta, FieldKind, LogField, LogFrame, MessageField, Row,
};
use std::collections::BTreeMap;

const MESSAGE_COLUMN: &str = "content";
const RESERVED_FIELDS: [&str; 2] = ["level", "id"];

/// 訊息欄位：優先使用 `content`，否則取第一個字串欄位
pub fn select_message_field(meta: &[ColumnMeta]) -> Option<&ColumnMeta> {
    meta.iter()
        .find(|col| col.name == MESSAGE_COLUMN)
        .or_else(|| {
            meta.iter()
                .find(|col| classify(&col.r#type) == FieldKind::String)
        })
}

/// Field kinds for log output. A leading `UInt64` column carries the timestamp.
fn log_field_kinds(meta: &[ColumnMeta]) -> Vec<FieldKind> {
    meta.iter()
        .enumerate()
        .map(|(index, col)| {
            if index == 0 && is_uint64(&col.r#type) {
                FieldKind::Time
            } else {
                classify(&col.r#type)
            }
        })
        .collect()
}

pub fn format_logs(ref_id: &str, meta: &[ColumnMeta], rows: &[Row]) -> Vec<LogFrame> {
    if rows.is_empty() {
        return Vec::new();
    }

    let Some(message_column) = select_message_field(meta) else {
        tracing::debug!("{}: no string column available for log messages", ref_id);
        return Vec::new();
    };

    let kinds = log_field_kinds(meta);
    let label_fields: Vec<&str> = meta
        .iter()
        .zip(&kinds)
        .filter(|(col, kind)| {
            **kind == FieldKind::String
                && col.name != message_column.name
                && !RESERVED_FIELDS.contains(&col.name.as_str())
        })
        .map(|(col, _)| col.name.as_str())
        .collect();

    rows.iter()
        .map(|row| {
            let labels: BTreeMap<String, String> = label_fields
                .iter()
                .filter_map(|name| {
                    row.get(name)
                        .filter(|value| !value.is_null())
                        .map(|value| (name.to_string(), display_value(value)))
                })
                .collect();

            let other_fields = meta
                .iter()
                .zip(&kinds)
                .filter(|(col, _)| {
                    col.name != message_column.name && !label_fields.contains(&col.name.as_str())
                })
                .filter_map(|(col, kind)| {
                    row.get(&col.name).map(|value| LogField {
                        name: col.name.clone(),
                        value: match kind {
                            FieldKind::Number => coerce_number(value),
                            _ => value.clone(),
                        },
                        r#type: *kind,
                    })
                })
                .collect();

            LogFrame {
                ref_id: ref_id.to_string(),
                preferred_visualisation_type: "logs",
                message_field: MessageField {
                    name: message_column.name.clone(),
                    value: row.get(&message_column.name).cloned().unwrap_or_default(),
                    labels,
                },
                other_fields,
            }
        })
        .collect()
}
