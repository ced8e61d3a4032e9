use crate::core::etl::shape_target;
use crate::core::time_value::SystemClock;
use crate::core::{ConfigProvider, Pipeline, Storage, TargetInput};
use crate::domain::model::{ResultSet, ShapedOutput, TargetResponse, TransformResult};
use crate::utils::error::Result;
use std::path::Path;

pub const RESPONSE_FILE: &str = "response.json";

/// 從檔案讀取查詢結果，輸出 `response.json` 與表格 CSV
pub struct FilePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> FilePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    async fn read_result_set(&self, path: &str) -> Result<ResultSet> {
        let bytes = self.storage.read_file(path).await?;
        let result_set: ResultSet = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            "Read {} rows / {} columns from {}",
            result_set.data.len(),
            result_set.meta.len(),
            path
        );
        Ok(result_set)
    }

    fn output_file(&self, name: &str) -> String {
        Path::new(self.config.output_path())
            .join(name)
            .to_string_lossy()
            .into_owned()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for FilePipeline<S, C> {
    async fn extract(&self) -> Result<Vec<TargetInput>> {
        let mut inputs = Vec::new();

        for target in self.config.targets() {
            if target.hide {
                tracing::debug!("Skipping hidden target {}", target.ref_id);
                continue;
            }

            let result_set = self.read_result_set(&target.input).await;
            if let Err(e) = &result_set {
                tracing::warn!("{}: failed to read {}: {}", target.ref_id, target.input, e);
            }

            inputs.push(TargetInput {
                target: target.clone(),
                result_set,
            });
        }

        Ok(inputs)
    }

    async fn transform(&self, inputs: Vec<TargetInput>) -> Result<TransformResult> {
        let request = self.config.request();

        let responses = inputs
            .into_iter()
            .map(|input| match input.result_set {
                Ok(result_set) => shape_target(&input.target, &result_set, request, SystemClock),
                Err(e) => TargetResponse::failed(&input.target.ref_id, e.to_string()),
            })
            .collect();

        Ok(TransformResult { responses })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = self.output_file(RESPONSE_FILE);

        for response in &result.responses {
            if let Some(ShapedOutput::Table(tables)) = &response.data {
                for (index, table) in tables.iter().enumerate() {
                    let name = if index == 0 {
                        format!("{}.csv", response.ref_id)
                    } else {
                        format!("{}_{}.csv", response.ref_id, index)
                    };
                    let csv = table.to_csv()?;
                    self.storage
                        .write_file(&self.output_file(&name), csv.as_bytes())
                        .await?;
                    tracing::debug!("Wrote table {} ({} rows)", name, table.rows.len());
                }
            }
        }

        let json = serde_json::to_string_pretty(&result.responses)?;
        tracing::debug!("Writing {} ({} bytes)", output_path, json.len());
        self.storage.write_file(&output_path, json.as_bytes()).await?;

        Ok(output_path)
    }
}
