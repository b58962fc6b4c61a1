use saldo_core::{DocumentKind, LedgerError};
use saldo_storage::JournalError;
use thiserror::Error;

/// Error taxonomy of the reconciliation engine. Expected business outcomes
/// (duplicate upload, parse failure recorded on the import row, a line that
/// simply finds no candidate) are not errors; they come back as structured
/// results from the operations themselves.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("statement {0} not found")]
    StatementNotFound(i64),
    #[error("statement line {0} not found")]
    LineNotFound(i64),
    #[error("import {0} not found")]
    ImportNotFound(i64),
    #[error("{kind} {id} not found")]
    DocumentNotFound { kind: DocumentKind, id: i64 },
    #[error("{kind} cannot match a {direction} line")]
    DirectionMismatch {
        kind: DocumentKind,
        direction: &'static str,
    },
    #[error("line {0} is already posted")]
    AlreadyPosted(i64),
    #[error("line {line_id} is {status}, not postable")]
    NotPostable { line_id: i64, status: &'static str },
    #[error("posting rules: {0}")]
    InvalidRules(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl From<JournalError> for EngineError {
    fn from(e: JournalError) -> Self {
        match e {
            JournalError::Ledger(e) => EngineError::Ledger(e),
            JournalError::Db(e) => EngineError::Storage(e),
        }
    }
}
