pub mod compare;
pub mod diff_engine;
pub mod filter;
pub mod worker;

pub use crate::domain::model::{
    CompareOptions, CompareRequest, DiffKind, DiffReport, DiffStats, Record, RecordDiff, Table,
};
pub use crate::domain::ports::{ComparePipeline, ConfigProvider, Storage};
pub use crate::utils::error::Result;
