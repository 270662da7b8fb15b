//! Record-level comparison of two parsed tables.
//!
//! Both tables are projected onto the aligned header set, normalized for
//! comparison, indexed by identity key and reconciled into an ordered list of
//! [`RecordDiff`]s. Every step is a pure function of its inputs.

use crate::domain::model::{
    CellValue, CompareOptions, DiffKind, DiffReport, DiffStats, Record, RecordDiff, Table,
};
use serde_json::Value;
use indexmap::IndexMap;
use std::collections::HashSet;

/// 已正規化的記錄，欄位順序與對齊後的標題一致
#[derive(Debug, Clone)]
pub struct IndexedRecord<'a> {
    pub position: usize,
    pub original: &'a Record,
    pub normalized: Vec<String>,
}

/// Identity key → record. `IndexMap::insert` on a repeated key keeps the
/// first slot and replaces the stored record.
pub type RecordIndex<'a> = IndexMap<String, IndexedRecord<'a>>;

pub struct DiffEngine {
    options: CompareOptions,
}

impl DiffEngine {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    pub fn compare(&self, old: &Table, new: &Table) -> DiffReport {
        let headers = align_headers(&old.headers, &new.headers, &self.options.ignored_columns);
        tracing::debug!(
            "Aligned {} headers ({} old, {} new, {} ignored)",
            headers.len(),
            old.headers.len(),
            new.headers.len(),
            self.options.ignored_columns.len()
        );

        let old_index = self.build_index(old, &headers);
        let new_index = self.build_index(new, &headers);
        tracing::debug!(
            "Indexed {} old keys from {} rows, {} new keys from {} rows",
            old_index.len(),
            old.data.len(),
            new_index.len(),
            new.data.len()
        );

        let differences = reconcile(&old_index, &new_index, &headers);
        let stats = calculate_stats(&differences);
        tracing::debug!(
            "Diff stats: total={}, modified={}, added={}, deleted={}",
            stats.total_rows,
            stats.modified_rows,
            stats.added_rows,
            stats.deleted_rows
        );

        DiffReport {
            headers,
            differences,
            stats,
        }
    }

    /// 比對用的值：缺少的欄位為空字串，依選項去除前後空白、轉小寫
    pub fn normalize_value(&self, value: Option<&CellValue>) -> String {
        let mut text = value.map(stringify).unwrap_or_default();

        if self.options.ignore_whitespace {
            text = text.trim_matches(is_trimmed).to_string();
        }

        if self.options.ignore_case {
            text = text.to_lowercase();
        }

        text
    }

    pub fn normalize_record(&self, record: &Record, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .map(|header| self.normalize_value(record.get(header)))
            .collect()
    }

    pub fn build_index<'a>(&self, table: &'a Table, headers: &[String]) -> RecordIndex<'a> {
        let key_column = self
            .options
            .primary_key
            .as_deref()
            .and_then(|key| headers.iter().position(|h| h == key));

        let mut index = RecordIndex::with_capacity(table.data.len());
        for (position, record) in table.data.iter().enumerate() {
            let normalized = self.normalize_record(record, headers);
            let key = match key_column.map(|column| normalized[column].as_str()) {
                Some(value) if !value.is_empty() => value.to_string(),
                // 沒有主鍵值時退回使用列號
                _ => position.to_string(),
            };

            index.insert(
                key,
                IndexedRecord {
                    position,
                    original: record,
                    normalized,
                },
            );
        }
        index
    }
}

pub fn compare_tables(old: &Table, new: &Table, options: &CompareOptions) -> DiffReport {
    DiffEngine::new(options.clone()).compare(old, new)
}

/// Ordered union of both header lists (old first), without ignored columns.
pub fn align_headers(old: &[String], new: &[String], ignored: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut aligned = Vec::new();
    for header in old.iter().chain(new.iter()) {
        if seen.insert(header.as_str()) && !ignored.contains(header) {
            aligned.push(header.clone());
        }
    }
    aligned
}

pub fn stringify(value: &CellValue) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(number) => stringify_number(number),
        other => other.to_string(),
    }
}

/// 整數值的浮點數輸出成整數，`1.0` 與 `1` 視為相同
fn stringify_number(number: &serde_json::Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() && float == 0.0 => "0".to_string(),
        Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e21 => {
            format!("{}", float)
        }
        _ => number.to_string(),
    }
}

/// Whitespace plus the byte-order mark, which `str::trim` keeps.
fn is_trimmed(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

pub fn reconcile(
    old_index: &RecordIndex<'_>,
    new_index: &RecordIndex<'_>,
    headers: &[String],
) -> Vec<RecordDiff> {
    let mut differences = Vec::with_capacity(old_index.len().max(new_index.len()));

    for (key, old_entry) in old_index.iter() {
        let diff = match new_index.get(key) {
            Some(new_entry) => {
                let changed_fields =
                    changed_fields(&old_entry.normalized, &new_entry.normalized, headers);
                let kind = if changed_fields.is_empty() {
                    DiffKind::Unchanged
                } else {
                    DiffKind::Modified
                };
                RecordDiff {
                    row_index: old_entry.position,
                    kind,
                    old_data: Some(snapshot(old_entry.original, headers)),
                    new_data: Some(snapshot(new_entry.original, headers)),
                    changed_fields,
                    identity_key: key.to_string(),
                }
            }
            None => RecordDiff {
                row_index: old_entry.position,
                kind: DiffKind::Deleted,
                old_data: Some(snapshot(old_entry.original, headers)),
                new_data: None,
                changed_fields: Vec::new(),
                identity_key: key.to_string(),
            },
        };
        differences.push(diff);
    }

    for (key, new_entry) in new_index.iter() {
        if old_index.contains_key(key) {
            continue;
        }
        differences.push(RecordDiff {
            row_index: new_entry.position,
            kind: DiffKind::Added,
            old_data: None,
            new_data: Some(snapshot(new_entry.original, headers)),
            changed_fields: Vec::new(),
            identity_key: key.to_string(),
        });
    }

    // sort_by_key is stable: equal row indexes keep old-before-new order
    differences.sort_by_key(|diff| diff.row_index);
    differences
}

fn changed_fields(old: &[String], new: &[String], headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .zip(old.iter().zip(new.iter()))
        .filter(|(_, (old_value, new_value))| old_value != new_value)
        .map(|(header, _)| header.clone())
        .collect()
}

/// 保留原始值供顯示，缺少的欄位補空字串
fn snapshot(record: &Record, headers: &[String]) -> Record {
    headers
        .iter()
        .map(|header| {
            let value = record
                .get(header)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            (header.clone(), value)
        })
        .collect()
}

pub fn calculate_stats(differences: &[RecordDiff]) -> DiffStats {
    let mut stats = DiffStats::default();

    for diff in differences {
        match diff.kind {
            DiffKind::Modified => stats.modified_rows += 1,
            DiffKind::Added => stats.added_rows += 1,
            DiffKind::Deleted => stats.deleted_rows += 1,
            DiffKind::Unchanged => {}
        }
    }

    stats.total_rows = stats.modified_rows + stats.added_rows + stats.deleted_rows;
    stats
}
