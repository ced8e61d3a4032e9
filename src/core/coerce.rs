use serde_json::{Number, Value};

/// Finite numeric interpretation of a number or numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    }
}

fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// null 保持 null；無法解析為數字的值原樣回傳；其餘轉為數字
pub fn coerce_number(value: &Value) -> Value {
    match value {
        Value::Null | Value::Number(_) => value.clone(),
        Value::Bool(b) => Value::from(u8::from(*b)),
        Value::String(s) => {
            if let Ok(int) = s.trim().parse::<i64>() {
                return Value::from(int);
            }
            parse_numeric(s)
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| value.clone())
        }
        _ => value.clone(),
    }
}
