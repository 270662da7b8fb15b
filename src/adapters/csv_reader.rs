use crate::domain::model::{Record, Table};
use crate::utils::error::{DiffError, Result};
use serde_json::Value;
use std::path::Path;

pub const MAX_FILE_SIZE_MB: u64 = 50;
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["csv", "json"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 依副檔名讀取表格：CSV 或已解析好的表格 JSON
pub fn read_table(filename: &str, bytes: &[u8]) -> Result<Table> {
    let extension = validate_input_file(filename, bytes.len() as u64)?;

    let table = match extension.as_str() {
        "json" => {
            let mut table: Table = serde_json::from_slice(strip_bom(bytes))?;
            if table.filename.is_empty() {
                table.filename = filename.to_string();
            }
            table.row_count = table.data.len();
            table
        }
        _ => parse_csv(filename, bytes)?,
    };

    tracing::debug!(
        "Read {} rows with {} columns from {}",
        table.row_count,
        table.headers.len(),
        filename
    );
    Ok(table)
}

/// 第一列為標題；完全空白的行由 csv 略過，只有逗號的列仍保留，每個儲存格去除前後空白
pub fn parse_csv(filename: &str, bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(strip_bom(bytes));

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut data = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let cell = row.get(i).unwrap_or_default();
                (header.clone(), Value::String(cell.to_string()))
            })
            .collect();
        data.push(record);
    }

    Ok(Table::new(filename, headers, data))
}

pub fn validate_input_file(filename: &str, size: u64) -> Result<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DiffError::UnsupportedFormat { extension });
    }

    if size > MAX_FILE_SIZE_MB * 1024 * 1024 {
        return Err(DiffError::FileTooLarge {
            filename: filename.to_string(),
            size_mb: size / (1024 * 1024),
            limit_mb: MAX_FILE_SIZE_MB,
        });
    }

    Ok(extension)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}
