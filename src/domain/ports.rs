use crate::adapters::export::ExportOptions;
use crate::domain::model::{CompareOptions, DiffReport, Table};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn old_file(&self) -> &str;
    fn new_file(&self) -> &str;
    fn output_path(&self) -> &str;
    /// 匯出格式：csv、json、zip
    fn output_formats(&self) -> &[String];
    fn compare_options(&self) -> CompareOptions;
    fn export_options(&self) -> ExportOptions;
    fn timeout(&self) -> Duration;
}

#[async_trait]
pub trait ComparePipeline: Send + Sync {
    async fn load(&self) -> Result<(Table, Table)>;
    async fn compare(&self, old: Table, new: Table) -> Result<DiffReport>;
    async fn export(&self, report: &DiffReport) -> Result<String>;
}
