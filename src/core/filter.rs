use crate::core::diff_engine::stringify;
use crate::domain::model::{DiffKind, DiffReport, RecordDiff};
use serde::{Deserialize, Serialize};

/// 結果檢視的篩選條件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffFilter {
    pub show_only_differences: bool,
    pub search_term: String,
    pub selected_kinds: Vec<DiffKind>,
    pub hidden_columns: Vec<String>,
}

impl Default for DiffFilter {
    fn default() -> Self {
        Self {
            show_only_differences: false,
            search_term: String::new(),
            selected_kinds: DiffKind::DIFFERENCES.to_vec(),
            hidden_columns: Vec::new(),
        }
    }
}

impl DiffFilter {
    pub fn only_differences() -> Self {
        Self {
            show_only_differences: true,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.show_only_differences
            || !self.search_term.is_empty()
            || self.narrows_kinds()
            || !self.hidden_columns.is_empty()
    }

    fn narrows_kinds(&self) -> bool {
        DiffKind::DIFFERENCES
            .iter()
            .any(|kind| !self.selected_kinds.contains(kind))
    }

    pub fn apply<'r>(&self, report: &'r DiffReport) -> Vec<&'r RecordDiff> {
        let needle = self.search_term.to_lowercase();
        let narrows_kinds = self.narrows_kinds();

        report
            .differences
            .iter()
            .filter(|diff| !self.show_only_differences || diff.kind.is_difference())
            // 未全選時，未變更的列也一併排除
            .filter(|diff| !narrows_kinds || self.selected_kinds.contains(&diff.kind))
            .filter(|diff| needle.is_empty() || matches_search(diff, &needle))
            .collect()
    }

    pub fn visible_headers<'r>(&self, report: &'r DiffReport) -> Vec<&'r str> {
        report
            .headers
            .iter()
            .filter(|header| !self.hidden_columns.contains(header))
            .map(String::as_str)
            .collect()
    }
}

fn matches_search(diff: &RecordDiff, needle: &str) -> bool {
    diff.display_data().is_some_and(|record| {
        record
            .data
            .values()
            .any(|value| stringify(value).to_lowercase().contains(needle))
    })
}
