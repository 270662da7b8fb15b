use anyhow::Context;
use clap::Parser;
use table_diff::adapters::csv_reader::read_table;
use table_diff::core::diff_engine::align_headers;
use table_diff::core::ConfigProvider;
use table_diff::utils::error::ErrorSeverity;
use table_diff::utils::{logger, validation::Validate};
use table_diff::{CompareJob, CsvComparePipeline, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-diff")]
#[command(about = "Table comparison driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "table-diff.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the primary key from config
    #[arg(long)]
    primary_key: Option<String>,

    /// Dry run - show the aligned columns without comparing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }

    tracing::info!("🚀 Starting TOML-based table comparison");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 套用命令列覆蓋設定
    if let Some(key) = args.primary_key {
        tracing::info!("🔧 Primary key overridden to: {}", key);
        config.compare.primary_key = Some(key);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No comparison will run");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = CsvComparePipeline::new(LocalStorage::new("."), config);
    let job = CompareJob::new_with_monitoring(pipeline, monitor_enabled);

    match job.run().await {
        Ok(output) => {
            tracing::info!("✅ Comparison completed successfully!");
            println!("✅ {} changes found", output.report.stats.total_rows);
            println!("📁 Output saved to: {}", output.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Comparison failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

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
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    let options = config.compare_options();
    tracing::info!("📋 Configuration Summary:");
    tracing::info!("   Old file: {}", config.old_file());
    tracing::info!("   New file: {}", config.new_file());
    tracing::info!(
        "   Primary key: {}",
        options.primary_key.as_deref().unwrap_or("(row position)")
    );
    tracing::info!(
        "   Ignore case: {}, ignore whitespace: {}",
        options.ignore_case,
        options.ignore_whitespace
    );
    if !options.ignored_columns.is_empty() {
        tracing::info!("   Ignored columns: {}", options.ignored_columns.join(", "));
    }
    tracing::info!("   Output: {} ({})", config.output_path(), config.output_formats().join(", "));
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let old = read_table(config.old_file(), &std::fs::read(config.old_file())?)
        .with_context(|| format!("reading {}", config.old_file()))?;
    let new = read_table(config.new_file(), &std::fs::read(config.new_file())?)
        .with_context(|| format!("reading {}", config.new_file()))?;
    let options = config.compare_options();
    let headers = align_headers(&old.headers, &new.headers, &options.ignored_columns);

    println!("🔍 Dry run:");
    println!("   Old rows: {}, new rows: {}", old.row_count, new.row_count);
    println!("   Compared columns ({}): {}", headers.len(), headers.join(", "));
    if let Some(key) = &options.primary_key {
        if !headers.contains(key) {
            println!("⚠️  Primary key '{}' is not a compared column; rows will match by position", key);
        }
    }

    Ok(())
}
