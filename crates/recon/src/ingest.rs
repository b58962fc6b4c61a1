use chrono::Utc;
use saldo_core::{FileFormat, ImportStatus};
use saldo_import::{classify, content_hash, parse_statement, StatementBatch};
use saldo_storage::{DbPool, NewBankStatement, NewDocumentImport};
use tracing::{info, warn};

use crate::error::EngineError;

/// Result of one ingestion attempt. Every variant except `Duplicate` leaves
/// exactly one new `document_imports` row behind.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Parsed and persisted as a statement with its lines.
    Imported {
        import_id: i64,
        statement_id: i64,
        line_count: usize,
    },
    /// Byte-identical file already imported for this tenant; no-op.
    Duplicate { existing_import_id: i64 },
    /// Format accepted but not auto-parseable (PDF) or not recognized at
    /// all; the row stays `pending` for manual handling.
    PendingManual {
        import_id: i64,
        format: Option<FileFormat>,
    },
    /// The parser rejected the file; the row holds the error message.
    ParseFailed { import_id: i64, error: String },
}

/// Ingest an uploaded bank file: hash, deduplicate, classify, record, and
/// for auto-parseable formats parse and persist the statement synchronously.
pub async fn ingest(
    pool: &DbPool,
    tenant_id: i64,
    bytes: &[u8],
    filename: &str,
    bank_account_id: Option<i64>,
) -> Result<IngestOutcome, EngineError> {
    let hash = content_hash(bytes);

    if let Some(existing) = saldo_storage::find_import_by_hash(pool, tenant_id, &hash).await? {
        info!(tenant_id, filename, existing_import_id = existing.id, "duplicate upload skipped");
        return Ok(IngestOutcome::Duplicate {
            existing_import_id: existing.id,
        });
    }

    let format = classify(filename);

    let inserted = saldo_storage::insert_import(
        pool,
        &NewDocumentImport {
            tenant_id,
            filename,
            format,
            file_size: bytes.len() as i64,
            content_hash: &hash,
            bank_account_id,
        },
    )
    .await;

    let import_id = match inserted {
        Ok(id) => id,
        // A concurrent ingest of the same bytes won the (tenant, hash)
        // unique constraint between our lookup and this insert.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let existing = saldo_storage::find_import_by_hash(pool, tenant_id, &hash)
                .await?
                .ok_or(sqlx::Error::Database(e))?;
            info!(tenant_id, filename, existing_import_id = existing.id, "duplicate upload skipped");
            return Ok(IngestOutcome::Duplicate {
                existing_import_id: existing.id,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let format = match format {
        Some(f @ (FileFormat::Xml | FileFormat::Csv)) => f,
        other => {
            info!(tenant_id, import_id, filename, "import left pending for manual handling");
            return Ok(IngestOutcome::PendingManual { import_id, format: other });
        }
    };

    saldo_storage::set_import_status(pool, tenant_id, import_id, ImportStatus::Processing).await?;

    let batch = match parse_statement(format, bytes) {
        Ok(batch) => batch,
        Err(e) => {
            let message = e.to_string();
            warn!(tenant_id, import_id, filename, error = %message, "statement parse failed");
            saldo_storage::mark_import_error(pool, tenant_id, import_id, &message).await?;
            return Ok(IngestOutcome::ParseFailed {
                import_id,
                error: message,
            });
        }
    };

    let statement_id = persist_batch(pool, tenant_id, filename, bank_account_id, &batch).await?;
    saldo_storage::mark_import_parsed(pool, tenant_id, import_id, batch.lines.len() as i64).await?;

    info!(
        tenant_id,
        import_id,
        statement_id,
        lines = batch.lines.len(),
        "statement imported"
    );

    Ok(IngestOutcome::Imported {
        import_id,
        statement_id,
        line_count: batch.lines.len(),
    })
}

async fn persist_batch(
    pool: &DbPool,
    tenant_id: i64,
    filename: &str,
    bank_account_id: Option<i64>,
    batch: &StatementBatch,
) -> Result<i64, EngineError> {
    // Parsers guarantee at least one line, so a date always exists; the
    // fallback only guards against an empty batch slipping through.
    let statement_date = batch
        .statement_date
        .or_else(|| batch.last_line_date())
        .unwrap_or_else(|| Utc::now().date_naive());

    let number = batch
        .statement_number
        .clone()
        .unwrap_or_else(|| filename.rsplit_once('.').map_or(filename, |(stem, _)| stem).to_string());

    let statement_id = saldo_storage::insert_statement_with_lines(
        pool,
        &NewBankStatement {
            tenant_id,
            bank_account_id,
            statement_date,
            statement_number: &number,
            currency: batch.currency.as_deref().unwrap_or("RSD"),
            closing_balance: batch.closing_balance(),
        },
        &batch.lines,
    )
    .await?;

    Ok(statement_id)
}

/// Flag an import for manual review. Parsed imports are left alone; the
/// quarantine state is for uploads that never made it into a statement.
pub async fn quarantine_import(
    pool: &DbPool,
    tenant_id: i64,
    import_id: i64,
) -> Result<(), EngineError> {
    let import = saldo_storage::get_import(pool, tenant_id, import_id)
        .await?
        .ok_or(EngineError::ImportNotFound(import_id))?;

    if import.status == ImportStatus::Pending || import.status == ImportStatus::Error {
        saldo_storage::set_import_status(pool, tenant_id, import_id, ImportStatus::Quarantine)
            .await?;
    }
    Ok(())
}
