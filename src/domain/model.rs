use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 單一儲存格的值，比對時一律轉成文字
pub type CellValue = Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, CellValue>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.data.get(field)
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let data = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { data }
    }
}

/// 已解析的表格，由上游解析器提供，比對引擎只讀不寫
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub filename: String,
    pub headers: Vec<String>,
    pub data: Vec<Record>,
    pub row_count: usize,
}

impl Table {
    pub fn new(filename: impl Into<String>, headers: Vec<String>, data: Vec<Record>) -> Self {
        let row_count = data.len();
        Self {
            filename: filename.into(),
            headers,
            data,
            row_count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompareOptions {
    pub primary_key: Option<String>,
    pub ignore_case: bool,
    pub ignore_whitespace: bool,
    pub ignored_columns: Vec<String>,
}

impl CompareOptions {
    /// 互動模式的建議預設值：忽略大小寫與前後空白
    pub fn interactive() -> Self {
        Self {
            ignore_case: true,
            ignore_whitespace: true,
            ..Self::default()
        }
    }

    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = Some(key.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Unchanged,
    Modified,
    Added,
    Deleted,
}

impl DiffKind {
    pub const DIFFERENCES: [DiffKind; 3] = [DiffKind::Modified, DiffKind::Added, DiffKind::Deleted];

    pub fn is_difference(self) -> bool {
        !matches!(self, DiffKind::Unchanged)
    }

    pub fn label(self) -> &'static str {
        match self {
            DiffKind::Unchanged => "Normal",
            DiffKind::Modified => "Modified",
            DiffKind::Added => "Added",
            DiffKind::Deleted => "Deleted",
        }
    }

    pub fn label_zh(self) -> &'static str {
        match self {
            DiffKind::Unchanged => "正常",
            DiffKind::Modified => "修改",
            DiffKind::Added => "新增",
            DiffKind::Deleted => "刪除",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDiff {
    /// 舊表中的原始位置；只存在於新表時為新表位置
    pub row_index: usize,
    #[serde(rename = "type")]
    pub kind: DiffKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_data: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_data: Option<Record>,
    pub changed_fields: Vec<String>,
    pub identity_key: String,
}

impl RecordDiff {
    /// 顯示用資料：優先新表，否則舊表
    pub fn display_data(&self) -> Option<&Record> {
        self.new_data.as_ref().or(self.old_data.as_ref())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    pub total_rows: usize,
    pub modified_rows: usize,
    pub added_rows: usize,
    pub deleted_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub headers: Vec<String>,
    pub differences: Vec<RecordDiff>,
    pub stats: DiffStats,
}

impl DiffReport {
    pub fn unchanged_rows(&self) -> usize {
        self.differences
            .iter()
            .filter(|d| d.kind == DiffKind::Unchanged)
            .count()
    }

    pub fn has_changes(&self) -> bool {
        self.stats.total_rows > 0
    }
}

/// 一次比對所需的全部輸入
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub old: Table,
    pub new: Table,
    #[serde(default)]
    pub options: CompareOptions,
}

impl CompareRequest {
    pub fn new(old: Table, new: Table, options: CompareOptions) -> Self {
        Self { old, new, options }
    }
}
