use crate::adapters::csv_reader::read_table;
use crate::adapters::export::{export, ExportFormat};
use crate::core::worker::CompareWorker;
use crate::core::{ComparePipeline, ConfigProvider, Storage};
use crate::domain::model::{CompareRequest, DiffReport, Table};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct JobOutput {
    pub report: DiffReport,
    /// 逗號分隔的輸出檔路徑
    pub output_path: String,
}

pub struct CompareJob<P: ComparePipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: ComparePipeline> CompareJob<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<JobOutput> {
        tracing::info!("🚀 Starting table comparison");

        tracing::info!("📥 Loading tables...");
        let (old, new) = self.pipeline.load().await?;
        tracing::info!(
            "📥 Loaded {} old rows and {} new rows",
            old.row_count,
            new.row_count
        );
        self.monitor.log_phase("Load");

        tracing::info!("🔍 Comparing...");
        let report = self.pipeline.compare(old, new).await?;
        tracing::info!(
            "🔍 {} changes: {} modified, {} added, {} deleted",
            report.stats.total_rows,
            report.stats.modified_rows,
            report.stats.added_rows,
            report.stats.deleted_rows
        );
        self.monitor.log_phase("Compare");

        tracing::info!("📤 Exporting...");
        let output_path = self.pipeline.export(&report).await?;
        self.monitor.log_phase("Export");
        self.monitor.log_final_stats();

        Ok(JobOutput {
            report,
            output_path,
        })
    }
}

/// 讀取兩個檔案、在背景執行比對、寫出設定的匯出格式
pub struct CsvComparePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    worker: CompareWorker,
}

impl<S: Storage, C: ConfigProvider> CsvComparePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let worker = CompareWorker::new(config.timeout());
        Self {
            storage,
            config,
            worker,
        }
    }

    async fn load_table(&self, path: &str) -> Result<Table> {
        tracing::debug!("Reading {}", path);
        let bytes = self.storage.read_file(path).await?;
        let filename = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(path);
        read_table(filename, &bytes)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> ComparePipeline for CsvComparePipeline<S, C> {
    async fn load(&self) -> Result<(Table, Table)> {
        tokio::try_join!(
            self.load_table(self.config.old_file()),
            self.load_table(self.config.new_file())
        )
    }

    async fn compare(&self, old: Table, new: Table) -> Result<DiffReport> {
        let request = CompareRequest::new(old, new, self.config.compare_options());
        self.worker.run(request).await
    }

    async fn export(&self, report: &DiffReport) -> Result<String> {
        let options = self.config.export_options();
        let mut written = Vec::new();

        for format in self.config.output_formats() {
            let format: ExportFormat = format.parse()?;
            let data = export(report, format, &options)?;
            let path = Path::new(self.config.output_path()).join(format.file_name());
            let path = path.to_string_lossy().into_owned();

            tracing::debug!("Writing {:?} export ({} bytes) to {}", format, data.len(), path);
            self.storage.write_file(&path, &data).await?;
            written.push(path);
        }

        Ok(written.join(","))
    }
}
