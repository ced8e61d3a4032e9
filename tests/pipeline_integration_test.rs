use serde_json::{json, Value};
use sql_series::core::Storage;
use sql_series::utils::validation::Validate;
use sql_series::{FilePipeline, LocalStorage, ShapeEngine, TomlConfig};
use tempfile::TempDir;

const CONFIG: &str = r#"
[request]
from = 1704067200
to = 1704067320
utc = true

[load]
output_path = "out"

[[targets]]
ref_id = "A"
format = "timeseries"
input = "cpu.json"
label_keys = "host"
extrapolate = false

[[targets]]
ref_id = "B"
format = "table"
input = "cpu.json"

[[targets]]
ref_id = "C"
format = "logs"
input = "events.json"

[[targets]]
ref_id = "D"
format = "variables"
input = "cpu.json"
variable_key = "host"

[[targets]]
ref_id = "E"
format = "timeseries"
input = "missing.json"

[[targets]]
ref_id = "F"
format = "table"
input = "cpu.json"
hide = true
"#;

async fn seed(storage: &LocalStorage) {
    let cpu = json!({
        "meta": [
            {"name": "t", "type": "DateTime"},
            {"name": "host", "type": "String"},
            {"name": "cpu", "type": "Float64"}
        ],
        "data": [
            {"t": "2024-01-01 00:00:00", "host": "a", "cpu": 10},
            {"t": "2024-01-01 00:01:00", "host": "b", "cpu": "20"}
        ],
        "rows": 2,
        "statistics": {"elapsed": 0.001, "rows_read": 2, "bytes_read": 64}
    });
    let events = json!({
        "meta": [
            {"name": "id", "type": "UInt64"},
            {"name": "content", "type": "String"},
            {"name": "service", "type": "LowCardinality(String)"}
        ],
        "data": [
            {"id": "1704067200000", "content": "started", "service": "api"},
            {"id": "1704067260000", "content": "stopped", "service": null}
        ]
    });

    storage
        .write_file("cpu.json", &serde_json::to_vec(&cpu).unwrap())
        .await
        .unwrap();
    storage
        .write_file("events.json", &serde_json::to_vec(&events).unwrap())
        .await
        .unwrap();
}

fn response_for<'a>(responses: &'a [Value], ref_id: &str) -> &'a Value {
    responses
        .iter()
        .find(|r| r["refId"] == ref_id)
        .unwrap_or_else(|| panic!("missing response for {}", ref_id))
}

#[tokio::test]
async fn test_end_to_end_shaping_from_toml() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_string_lossy().into_owned());
    seed(&storage).await;

    let config = TomlConfig::from_toml_str(CONFIG)?;
    config.validate()?;

    let pipeline = FilePipeline::new(storage.clone(), config);
    let engine = ShapeEngine::new(pipeline);
    let output_path = engine.run().await?;
    assert!(output_path.ends_with("response.json"));

    let response_path = temp_dir.path().join(&output_path);
    let responses: Vec<Value> = serde_json::from_slice(&std::fs::read(&response_path)?)?;

    // 隱藏目標不輸出
    assert_eq!(responses.len(), 5);
    assert!(responses.iter().all(|r| r["refId"] != "F"));

    let series = response_for(&responses, "A");
    assert_eq!(series["data"]["format"], "timeseries");
    assert_eq!(
        series["data"]["frames"],
        json!([
            {"target": "a", "datapoints": [[10, 1_704_067_200_000i64], [null, 1_704_067_260_000i64]]},
            {"target": "b", "datapoints": [[null, 1_704_067_200_000i64], [20, 1_704_067_260_000i64]]}
        ])
    );

    let table = response_for(&responses, "B");
    assert_eq!(table["data"]["frames"][0]["columns"][0], json!({"text": "t", "type": "string"}));
    assert_eq!(table["data"]["frames"][0]["rows"][1], json!(["2024-01-01 00:01:00", "b", 20]));

    let logs = response_for(&responses, "C");
    let frames = logs["data"]["frames"].as_array().unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["refId"], "C");
    assert_eq!(frames[0]["preferredVisualisationType"], "logs");
    assert_eq!(frames[0]["messageField"]["value"], "started");
    assert_eq!(frames[0]["messageField"]["labels"], json!({"service": "api"}));
    assert_eq!(frames[1]["messageField"]["labels"], json!({}));
    assert_eq!(frames[0]["otherFields"][0]["type"], "time");

    let variables = response_for(&responses, "D");
    assert_eq!(
        variables["data"]["frames"],
        json!([{"text": "a"}, {"text": "b"}])
    );

    let missing = response_for(&responses, "E");
    assert!(missing["data"].is_null());
    assert!(!missing["error"].as_str().unwrap().is_empty());

    let csv = std::fs::read_to_string(temp_dir.path().join("out").join("B.csv"))?;
    assert_eq!(
        csv,
        "t,host,cpu\n2024-01-01 00:00:00,a,10\n2024-01-01 00:01:00,b,20\n"
    );

    Ok(())
}

#[tokio::test]
async fn test_upstream_error_isolated_per_target() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_string_lossy().into_owned());
    seed(&storage).await;

    let failed = json!({
        "meta": [],
        "data": null,
        "error": "Code: 47. DB::Exception: Missing columns: 'cpux'"
    });
    storage
        .write_file("failed.json", &serde_json::to_vec(&failed)?)
        .await?;

    let config = TomlConfig::from_toml_str(
        r#"
[load]
output_path = "out"

[[targets]]
ref_id = "A"
format = "table"
input = "failed.json"

[[targets]]
ref_id = "B"
format = "table"
input = "cpu.json"
"#,
    )?;

    let engine = ShapeEngine::new(FilePipeline::new(storage, config));
    let output_path = engine.run().await?;

    let responses: Vec<Value> =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join(&output_path))?)?;
    assert!(response_for(&responses, "A")["error"]
        .as_str()
        .unwrap()
        .contains("Missing columns"));
    assert!(response_for(&responses, "B")["error"].is_null());
    assert_eq!(response_for(&responses, "B")["data"]["frames"][0]["rows"].as_array().unwrap().len(), 2);

    assert!(!temp_dir.path().join("out").join("A.csv").exists());
    assert!(temp_dir.path().join("out").join("B.csv").exists());

    Ok(())
}
