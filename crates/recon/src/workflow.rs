use saldo_core::{DocumentKind, MatchStatus};
use saldo_storage::DbPool;
use tracing::info;

use crate::error::EngineError;

/// Operator override: pair a line with a document by hand. Replaces any
/// prior automatic status unconditionally; no confidence is recorded for a
/// human decision. Polarity is still enforced, and a posted line is
/// immutable.
pub async fn manual_match(
    pool: &DbPool,
    tenant_id: i64,
    line_id: i64,
    kind: DocumentKind,
    document_id: i64,
) -> Result<(), EngineError> {
    let line = saldo_storage::get_line(pool, tenant_id, line_id)
        .await?
        .ok_or(EngineError::LineNotFound(line_id))?;

    if line.is_posted() {
        return Err(EngineError::AlreadyPosted(line_id));
    }
    if kind.direction() != line.direction {
        return Err(EngineError::DirectionMismatch {
            kind,
            direction: line.direction.as_str(),
        });
    }

    let (invoice_id, supplier_invoice_id) = match kind {
        DocumentKind::Invoice => {
            saldo_storage::get_invoice(pool, tenant_id, document_id)
                .await?
                .ok_or(EngineError::DocumentNotFound { kind, id: document_id })?;
            (Some(document_id), None)
        }
        DocumentKind::SupplierInvoice => {
            saldo_storage::get_supplier_invoice(pool, tenant_id, document_id)
                .await?
                .ok_or(EngineError::DocumentNotFound { kind, id: document_id })?;
            (None, Some(document_id))
        }
    };

    saldo_storage::update_line_match(
        pool,
        tenant_id,
        line_id,
        MatchStatus::ManuallyMatched,
        None,
        invoice_id,
        supplier_invoice_id,
    )
    .await?;

    info!(tenant_id, line_id, %kind, document_id, "manual match recorded");
    Ok(())
}

/// Promote every `suggested` line of a statement to `matched` in one step.
/// Unmatched and already-confirmed lines are untouched.
pub async fn bulk_confirm(
    pool: &DbPool,
    tenant_id: i64,
    statement_id: i64,
) -> Result<u64, EngineError> {
    saldo_storage::get_statement(pool, tenant_id, statement_id)
        .await?
        .ok_or(EngineError::StatementNotFound(statement_id))?;

    let confirmed = saldo_storage::bulk_confirm_suggested(pool, tenant_id, statement_id).await?;
    info!(tenant_id, statement_id, confirmed, "suggestions confirmed");
    Ok(confirmed)
}

/// Dismiss a line from reconciliation. Terminal: an excluded line is never
/// matched or posted. Posted lines cannot be excluded.
pub async fn exclude_line(
    pool: &DbPool,
    tenant_id: i64,
    line_id: i64,
) -> Result<(), EngineError> {
    let line = saldo_storage::get_line(pool, tenant_id, line_id)
        .await?
        .ok_or(EngineError::LineNotFound(line_id))?;

    if line.is_posted() {
        return Err(EngineError::AlreadyPosted(line_id));
    }

    saldo_storage::update_line_match(
        pool,
        tenant_id,
        line_id,
        MatchStatus::Excluded,
        None,
        None,
        None,
    )
    .await?;
    Ok(())
}
