// Adapters layer: turn files into tables and reports into files. The diff engine never touches these.

pub mod csv_reader;
pub mod export;
