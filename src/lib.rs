pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{cli::LocalStorage, toml_config::TomlConfig};
pub use crate::core::{
    compare::{CompareJob, CsvComparePipeline, JobOutput},
    diff_engine::{compare_tables, DiffEngine},
    filter::DiffFilter,
    worker::{CancelFlag, CompareWorker},
};
pub use crate::domain::model::{
    CompareOptions, CompareRequest, DiffKind, DiffReport, DiffStats, Record, RecordDiff, Table,
};
pub use crate::utils::error::{DiffError, Result};
