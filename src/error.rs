use serde::Serialize;
use thiserror::Error;

use crate::model::FieldRole;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(
        "column '{column}' mapped as {role} was not found in the table (available: {available})"
    )]
    MissingColumn {
        role: FieldRole,
        column: String,
        available: String,
    },

    #[error(
        "no usable rows remain after cleaning ({rows_dropped} of {rows_total} rows dropped); check the column mapping and number formats"
    )]
    EmptyDataset {
        rows_total: usize,
        rows_dropped: usize,
    },

    #[error("could not read table: {message}")]
    InvalidTable { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseWarning {
    // 1-based, header excluded
    pub row: usize,
    pub column: String,
    pub role: FieldRole,
    pub raw: String,
}
