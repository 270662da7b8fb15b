use crate::core::diff_engine::stringify;
use crate::domain::model::{DiffKind, DiffReport, DiffStats, RecordDiff};
use crate::utils::error::{DiffError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;
use zip::write::{FileOptions, ZipWriter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Zip,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Csv => "diff_report.csv",
            ExportFormat::Json => "diff_report.json",
            ExportFormat::Zip => "diff_report.zip",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "zip" => Ok(ExportFormat::Zip),
            other => Err(DiffError::InvalidConfigValueError {
                field: "output_formats".to_string(),
                value: other.to_string(),
                reason: "Supported formats: csv, json, zip".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportLocale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh-tw")]
    ZhTw,
}

impl FromStr for ExportLocale {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "en" => Ok(ExportLocale::En),
            "zh-tw" | "zh" => Ok(ExportLocale::ZhTw),
            other => Err(DiffError::InvalidConfigValueError {
                field: "locale".to_string(),
                value: other.to_string(),
                reason: "Supported locales: en, zh-tw".to_string(),
            }),
        }
    }
}

struct Labels {
    summary: &'static str,
    total: &'static str,
    details: &'static str,
    status: &'static str,
    row: &'static str,
}

impl ExportLocale {
    fn labels(self) -> Labels {
        match self {
            ExportLocale::En => Labels {
                summary: "Diff Summary",
                total: "Total Changes",
                details: "Details",
                status: "Status",
                row: "Row",
            },
            ExportLocale::ZhTw => Labels {
                summary: "差異統計摘要",
                total: "總變更",
                details: "詳細差異",
                status: "狀態",
                row: "行號",
            },
        }
    }

    fn kind_label(self, kind: DiffKind) -> &'static str {
        match self {
            ExportLocale::En => kind.label(),
            ExportLocale::ZhTw => kind.label_zh(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub include_only_differences: bool,
    pub include_stats: bool,
    pub locale: ExportLocale,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_only_differences: false,
            include_stats: true,
            locale: ExportLocale::default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportSummary<'r> {
    generated_at: DateTime<Utc>,
    headers: &'r [String],
    stats: DiffStats,
    unchanged_rows: usize,
}

pub fn export(report: &DiffReport, format: ExportFormat, options: &ExportOptions) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => export_csv(report, options),
        ExportFormat::Json => export_json(report, options),
        ExportFormat::Zip => export_bundle(report, options),
    }
}

fn selected_rows<'r>(report: &'r DiffReport, options: &ExportOptions) -> Vec<&'r RecordDiff> {
    report
        .differences
        .iter()
        .filter(|diff| !options.include_only_differences || diff.kind.is_difference())
        .collect()
}

/// 加上 BOM 的 CSV，試算表軟體才能正確辨識 UTF-8
pub fn export_csv(report: &DiffReport, options: &ExportOptions) -> Result<Vec<u8>> {
    let labels = options.locale.labels();
    let mut buffer = b"\xEF\xBB\xBF".to_vec();

    if options.include_stats {
        let stats = &report.stats;
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buffer);
        writer.write_record([labels.summary])?;
        writer.write_record([labels.total, stats.total_rows.to_string().as_str()])?;
        for (kind, count) in [
            (DiffKind::Modified, stats.modified_rows),
            (DiffKind::Added, stats.added_rows),
            (DiffKind::Deleted, stats.deleted_rows),
        ] {
            let label = options.locale.kind_label(kind);
            writer.write_record([label, count.to_string().as_str()])?;
        }
        writer.flush()?;
        drop(writer);
        buffer.push(b'\n');
    }

    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buffer);
        if options.include_stats {
            writer.write_record([labels.details])?;
        }

        let mut header_row = vec![labels.status.to_string(), labels.row.to_string()];
        header_row.extend(report.headers.iter().cloned());
        writer.write_record(&header_row)?;

        for diff in selected_rows(report, options) {
            let data = diff.display_data();
            let mut row = vec![
                options.locale.kind_label(diff.kind).to_string(),
                (diff.row_index + 1).to_string(),
            ];
            row.extend(report.headers.iter().map(|header| {
                data.and_then(|record| record.get(header))
                    .map(stringify)
                    .unwrap_or_default()
            }));
            writer.write_record(&row)?;
        }
        writer.flush()?;
    }

    Ok(buffer)
}

pub fn export_json(report: &DiffReport, options: &ExportOptions) -> Result<Vec<u8>> {
    let json = if options.include_only_differences {
        let filtered = DiffReport {
            headers: report.headers.clone(),
            differences: selected_rows(report, options).into_iter().cloned().collect(),
            stats: report.stats,
        };
        serde_json::to_vec_pretty(&filtered)?
    } else {
        serde_json::to_vec_pretty(report)?
    };
    Ok(json)
}

pub fn export_bundle(report: &DiffReport, options: &ExportOptions) -> Result<Vec<u8>> {
    let csv_data = export_csv(report, options)?;
    let json_data = export_json(report, options)?;
    let summary = ExportSummary {
        generated_at: Utc::now(),
        headers: &report.headers,
        stats: report.stats,
        unchanged_rows: report.unchanged_rows(),
    };

    tracing::debug!(
        "Creating ZIP bundle (csv {} bytes, json {} bytes)",
        csv_data.len(),
        json_data.len()
    );

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>("diff.csv", FileOptions::default())?;
    zip.write_all(&csv_data)?;

    zip.start_file::<_, ()>("report.json", FileOptions::default())?;
    zip.write_all(&json_data)?;

    zip.start_file::<_, ()>("summary.json", FileOptions::default())?;
    zip.write_all(&serde_json::to_vec_pretty(&summary)?)?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diff_engine::compare_tables;
    use crate::domain::model::{CompareOptions, Record, Table};
    use serde_json::json;
    use std::io::Read;

    fn report() -> DiffReport {
        let headers = vec!["id".to_string(), "name".to_string()];
        let old = Table::new(
            "old.csv",
            headers.clone(),
            vec![
                Record::from_iter([("id", json!("1")), ("name", json!("A"))]),
                Record::from_iter([("id", json!("2")), ("name", json!("B"))]),
            ],
        );
        let new = Table::new(
            "new.csv",
            headers,
            vec![
                Record::from_iter([("id", json!("1")), ("name", json!("A"))]),
                Record::from_iter([("id", json!("2")), ("name", json!("Say \"hi\""))]),
                Record::from_iter([("id", json!("3")), ("name", json!("D"))]),
            ],
        );
        compare_tables(&old, &new, &CompareOptions::default().with_primary_key("id"))
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_csv_with_stats() {
        let csv = text(export_csv(&report(), &ExportOptions::default()).unwrap());

        assert!(csv.starts_with('\u{feff}'));
        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
        assert_eq!(
            lines,
            vec![
                "Diff Summary",
                "Total Changes,2",
                "Modified,1",
                "Added,1",
                "Deleted,0",
                "",
                "Details",
                "Status,Row,id,name",
                "Normal,1,1,A",
                "Modified,2,2,\"Say \"\"hi\"\"\"",
                "Added,3,3,D",
            ]
        );
    }

    #[test]
    fn test_csv_only_differences_zh() {
        let options = ExportOptions {
            include_only_differences: true,
            include_stats: false,
            locale: ExportLocale::ZhTw,
        };
        let csv = text(export_csv(&report(), &options).unwrap());
        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();

        assert_eq!(lines[0], "狀態,行號,id,name");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("新增,3,"));
    }

    #[test]
    fn test_json_only_differences() {
        let options = ExportOptions {
            include_only_differences: true,
            ..ExportOptions::default()
        };
        let value: serde_json::Value =
            serde_json::from_slice(&export_json(&report(), &options).unwrap()).unwrap();

        assert_eq!(value["differences"].as_array().unwrap().len(), 2);
        assert_eq!(value["stats"]["totalRows"], 2);
    }

    #[test]
    fn test_bundle_contains_all_files() {
        let data = export_bundle(&report(), &ExportOptions::default()).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data)).unwrap();

        assert_eq!(archive.len(), 3);
        let mut summary = String::new();
        archive
            .by_name("summary.json")
            .unwrap()
            .read_to_string(&mut summary)
            .unwrap();
        let summary: serde_json::Value = serde_json::from_str(&summary).unwrap();
        assert_eq!(summary["unchangedRows"], 1);
        assert!(summary["generatedAt"].is_string());
        assert!(archive.by_name("diff.csv").is_ok());
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(" zip ".parse::<ExportFormat>().unwrap(), ExportFormat::Zip);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!("zh_TW".parse::<ExportLocale>().unwrap(), ExportLocale::ZhTw);
        assert!("fr".parse::<ExportLocale>().is_err());
    }
}
