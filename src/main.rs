use clap::Parser;
use table_diff::utils::error::{DiffError, ErrorSeverity};
use table_diff::utils::{logger, validation::Validate};
use table_diff::{CliConfig, CompareJob, CsvComparePipeline, LocalStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 合併設定檔與命令列參數
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }

    tracing::info!("Starting table-diff CLI");
    if let Some(path) = &cli.config {
        tracing::info!("📁 Loaded configuration from: {}", path);
    }
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(".");
    let pipeline = CsvComparePipeline::new(storage, config);
    let job = CompareJob::new_with_monitoring(pipeline, monitor_enabled);

    match job.run().await {
        Ok(output) => {
            let stats = output.report.stats;
            tracing::info!("✅ Comparison completed successfully!");
            tracing::info!("📁 Output saved to: {}", output.output_path);
            println!(
                "✅ {} changes ({} modified, {} added, {} deleted), {} unchanged",
                stats.total_rows,
                stats.modified_rows,
                stats.added_rows,
                stats.deleted_rows,
                output.report.unchanged_rows()
            );
            println!("📁 Output saved to: {}", output.output_path);
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn exit_with(e: DiffError) {
    tracing::error!(
        "❌ Comparison failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 依錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
}
