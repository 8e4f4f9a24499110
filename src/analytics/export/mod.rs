use thiserror::Error;

pub mod csv_exporter;

pub use csv_exporter::CsvExporter;

/// エクスポートエラー
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}
