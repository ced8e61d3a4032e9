use crate::domain::model::{display_value, ResultSet, VariableOption};
use crate::utils::error::{Result, ShapeError};

/// 變數查詢：取出每一列在 `key` 欄位的值
pub fn variable_values(result_set: &ResultSet, key: &str) -> Result<Vec<VariableOption>> {
    if key.trim().is_empty() {
        return Err(ShapeError::MissingConfigError {
            field: "variable_key".to_string(),
        });
    }

    let Some(first) = result_set.data.first() else {
        return Ok(Vec::new());
    };

    if first.get(key).is_none() {
        return Err(ShapeError::VariableKeyError {
            key: key.to_string(),
        });
    }

    Ok(result_set
        .data
        .iter()
        .map(|row| VariableOption {
            text: row.get(key).map(display_value).unwrap_or_default(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ColumnMeta;
    use serde_json::json;

    fn result_set() -> ResultSet {
        ResultSet::new(
            vec![ColumnMeta::new("host", "String"), ColumnMeta::new("n", "UInt8")],
            vec![
                serde_json::from_value(json!({"host": "web-1", "n": 1})).unwrap(),
                serde_json::from_value(json!({"host": "web-2", "n": 2})).unwrap(),
            ],
        )
    }

    #[test]
    fn test_values_for_key() {
        let options = variable_values(&result_set(), "host").unwrap();
        let texts: Vec<&str> = options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["web-1", "web-2"]);

        let numbers = variable_values(&result_set(), "n").unwrap();
        assert_eq!(numbers[1].text, "2");
    }

    #[test]
    fn test_unknown_key_and_blank_key() {
        assert!(matches!(
            variable_values(&result_set(), "region"),
            Err(ShapeError::VariableKeyError { .. })
        ));
        assert!(matches!(
            variable_values(&result_set(), "  "),
            Err(ShapeError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_empty_result() {
        let empty = ResultSet::new(vec![ColumnMeta::new("host", "String")], vec![]);
        assert!(variable_values(&empty, "host").unwrap().is_empty());
    }
}
