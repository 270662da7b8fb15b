use anyhow::Result;
use std::io::Read;
use table_diff::{
    CliConfig, CompareJob, CsvComparePipeline, DiffError, DiffKind, LocalStorage, TomlConfig,
};
use tempfile::TempDir;

const OLD_CSV: &str = "id,name,email,note\n1,Alice,alice@example.com,vip\n2,Bob,bob@example.com,\n3,Carol,carol@example.com,left\n";
const NEW_CSV: &str = "id,name,email,note,phone\n1,Alice,ALICE@example.com,vip,\n2,Bob , bob@example.com,changed,555\n4,Dan,dan@example.com,,\n";

fn write_inputs(dir: &TempDir) -> Result<(String, String)> {
    let old_path = dir.path().join("old.csv");
    let new_path = dir.path().join("new.csv");
    std::fs::write(&old_path, OLD_CSV)?;
    std::fs::write(&new_path, NEW_CSV)?;
    Ok((
        old_path.to_string_lossy().into_owned(),
        new_path.to_string_lossy().into_owned(),
    ))
}

#[tokio::test]
async fn test_end_to_end_csv_and_json_exports() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (old_path, new_path) = write_inputs(&temp_dir)?;
    let output_dir = temp_dir.path().join("out");

    let mut config = CliConfig::new(old_path, new_path);
    config.primary_key = Some("id".to_string());
    config.ignore_case = true;
    config.ignored_columns = vec!["note".to_string()];
    config.output_path = Some(output_dir.to_string_lossy().into_owned());
    config.output_formats = vec!["csv".to_string(), "json".to_string()];

    let pipeline = CsvComparePipeline::new(LocalStorage::new("."), config.resolve()?);
    let output = CompareJob::new(pipeline).run().await?;

    let report = &output.report;
    assert_eq!(report.headers, vec!["id", "name", "email", "phone"]);
    let kinds: Vec<(&str, DiffKind)> = report
        .differences
        .iter()
        .map(|d| (d.identity_key.as_str(), d.kind))
        .collect();
    // 解析時已去除前後空白，只剩 phone 有差異
    assert_eq!(
        kinds,
        vec![
            ("1", DiffKind::Unchanged),
            ("2", DiffKind::Modified),
            ("3", DiffKind::Deleted),
            ("4", DiffKind::Added),
        ]
    );
    assert_eq!(report.differences[1].changed_fields, vec!["phone"]);
    assert_eq!(report.stats.total_rows, 3);

    let paths: Vec<&str> = output.output_path.split(',').collect();
    assert_eq!(paths.len(), 2);

    let csv = std::fs::read_to_string(output_dir.join("diff_report.csv"))?;
    assert!(csv.contains("Status,Row,id,name,email,phone"));
    assert!(csv.contains("Deleted,3,3,Carol,carol@example.com,"));

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(output_dir.join("diff_report.json"))?)?;
    assert_eq!(json["stats"]["modifiedRows"], 1);
    assert_eq!(json["differences"].as_array().map(Vec::len), Some(4));

    Ok(())
}

#[tokio::test]
async fn test_end_to_end_zip_bundle_from_toml() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (old_path, new_path) = write_inputs(&temp_dir)?;
    let output_dir = temp_dir.path().join("bundle").to_string_lossy().replace('\\', "/");

    let config = TomlConfig::from_toml_str(&format!(
        r#"
[input]
old_file = "{}"
new_file = "{}"

[compare]
primary_key = "id"

[output]
path = "{}"
formats = ["zip"]
only_differences = true
locale = "zh-tw"
"#,
        old_path.replace('\\', "/"),
        new_path.replace('\\', "/"),
        output_dir
    ))?;

    let pipeline = CsvComparePipeline::new(LocalStorage::new("."), config);
    let output = CompareJob::new_with_monitoring(pipeline, true).run().await?;
    assert!(output.output_path.ends_with("diff_report.zip"));

    let zip_data = std::fs::read(&output.output_path)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data))?;
    let mut csv = String::new();
    archive.by_name("diff.csv")?.read_to_string(&mut csv)?;

    assert!(csv.contains("差異統計摘要"));
    assert!(csv.contains("狀態,行號,id,name,email,note,phone"));
    // only_differences：未變更的列不輸出
    assert!(!csv.contains("正常"));
    assert!(csv.contains("修改,1,1,Alice,ALICE@example.com"));

    Ok(())
}

#[tokio::test]
async fn test_missing_input_file_fails_with_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = CliConfig::new("missing_old.csv", "missing_new.csv");
    config.output_path = Some(temp_dir.path().to_string_lossy().into_owned());

    let pipeline =
        CsvComparePipeline::new(LocalStorage::new(temp_dir.path()), config.resolve().unwrap());
    let result = CompareJob::new(pipeline).run().await;

    assert!(matches!(result, Err(DiffError::IoError(_))));
}

#[tokio::test]
async fn test_unsupported_input_format_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("old.xlsx"), b"PK").unwrap();
    std::fs::write(temp_dir.path().join("new.csv"), "id\n1\n").unwrap();

    let mut config = CliConfig::new("old.xlsx", "new.csv");
    config.output_path = Some(temp_dir.path().to_string_lossy().into_owned());

    let pipeline =
        CsvComparePipeline::new(LocalStorage::new(temp_dir.path()), config.resolve().unwrap());
    let result = CompareJob::new(pipeline).run().await;

    assert!(matches!(result, Err(DiffError::UnsupportedFormat { .. })));
}

#[tokio::test]
async fn test_cli_flags_layered_over_config_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (old_path, new_path) = write_inputs(&temp_dir)?;
    let output_dir = temp_dir.path().join("layered");
    let config_path = temp_dir.path().join("table-diff.toml");
    std::fs::write(
        &config_path,
        format!(
            "[input]\nold_file = \"{}\"\nnew_file = \"{}\"\n\n[compare]\nprimary_key = \"id\"\n\n[output]\nformats = [\"zip\"]\n",
            old_path.replace('\\', "/"),
            new_path.replace('\\', "/")
        ),
    )?;

    let mut config = CliConfig::new(old_path, new_path);
    config.config = Some(config_path.to_string_lossy().into_owned());
    config.old_file = None;
    config.new_file = None;
    config.ignore_case = true;
    config.ignored_columns = vec!["note".to_string(), "phone".to_string()];
    config.output_formats = vec!["json".to_string()];
    config.output_path = Some(output_dir.to_string_lossy().into_owned());

    let pipeline = CsvComparePipeline::new(LocalStorage::new("."), config.resolve()?);
    let output = CompareJob::new(pipeline).run().await?;

    // 主鍵來自設定檔，忽略大小寫與忽略欄位來自命令列
    assert!(output.output_path.ends_with("diff_report.json"));
    assert_eq!(output.report.headers, vec!["id", "name", "email"]);
    assert_eq!(output.report.stats.modified_rows, 0);
    assert_eq!(output.report.stats.total_rows, 2);

    Ok(())
}
