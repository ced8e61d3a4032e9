use crate::domain::model::{FieldKind, TableColumnType};

const WRAPPERS: [&str; 2] = ["Nullable(", "LowCardinality("];

/// 去除 `Nullable(...)` / `LowCardinality(...)` 包裝，可多層巢狀
pub fn unwrap_type(tag: &str) -> &str {
    let mut current = tag.trim();
    loop {
        let inner = WRAPPERS.iter().find_map(|prefix| {
            current
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(')'))
        });

        match inner {
            Some(inner) => current = inner.trim(),
            None => return current,
        }
    }
}

/// Base name of an unwrapped tag, without parameters (`DateTime64(3)` -> `DateTime64`).
fn base_type(tag: &str) -> &str {
    let unwrapped = unwrap_type(tag);
    unwrapped
        .split_once('(')
        .map_or(unwrapped, |(base, _)| base)
        .trim()
}

/// Maps a source type tag to its semantic kind. Unknown tags are strings.
pub fn classify(tag: &str) -> FieldKind {
    match base_type(tag) {
        "UInt8" | "UInt16" | "UInt32" | "UInt64" | "UInt128" | "UInt256" | "Int8" | "Int16"
        | "Int32" | "Int64" | "Int128" | "Int256" | "Float32" | "Float64" | "Decimal"
        | "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => FieldKind::Number,
        "Date" | "Date32" | "DateTime" | "DateTime64" => FieldKind::Time,
        "IPv4" | "IPv6" => FieldKind::Other,
        _ => FieldKind::String,
    }
}

pub fn js_type(tag: &str) -> TableColumnType {
    match classify(tag) {
        FieldKind::Number => TableColumnType::Number,
        _ => TableColumnType::String,
    }
}

pub fn is_floating(tag: &str) -> bool {
    tag.contains("Float")
}

pub fn is_uint64(tag: &str) -> bool {
    unwrap_type(tag) == "UInt64"
}
