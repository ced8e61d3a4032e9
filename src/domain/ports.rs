use crate::domain::model::{QueryTarget, RequestOptions, ResultSet, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn request(&self) -> &RequestOptions;
    fn targets(&self) -> &[QueryTarget];
}

/// 單一查詢目標的輸入；讀取失敗時保留錯誤，讓其他目標繼續處理
#[derive(Debug)]
pub struct TargetInput {
    pub target: QueryTarget,
    pub result_set: Result<ResultSet>,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<TargetInput>>;
    async fn transform(&self, inputs: Vec<TargetInput>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
