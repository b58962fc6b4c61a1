use saldo_core::{Direction, DocumentKind, MatchStatus, StatementStatus};
use saldo_import::match_engine::{best_candidate, OpenDocument};
use saldo_storage::DbPool;
use tracing::info;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    /// Lines that acquired a tentative match (`matched` or `suggested`).
    pub matched: usize,
    /// Unmatched lines examined.
    pub considered: usize,
}

/// Score every `unmatched` line of a statement against the tenant's open
/// documents and persist the best candidate per line. Matching is advisory:
/// no journal entries are written and no document statuses change here.
/// Lines that already carry a match are never re-scored or downgraded.
pub async fn auto_match(
    pool: &DbPool,
    tenant_id: i64,
    statement_id: i64,
) -> Result<MatchSummary, EngineError> {
    let statement = saldo_storage::get_statement(pool, tenant_id, statement_id)
        .await?
        .ok_or(EngineError::StatementNotFound(statement_id))?;

    let lines =
        saldo_storage::get_lines_with_status(pool, tenant_id, statement_id, MatchStatus::Unmatched)
            .await?;

    let receivables: Vec<OpenDocument> = saldo_storage::get_open_invoices(pool, tenant_id)
        .await?
        .into_iter()
        .map(|i| OpenDocument {
            id: i.id,
            kind: DocumentKind::Invoice,
            number: i.number,
            partner_name: i.partner_name,
            total: i.total,
            due_date: i.due_date,
        })
        .collect();

    let payables: Vec<OpenDocument> = saldo_storage::get_open_supplier_invoices(pool, tenant_id)
        .await?
        .into_iter()
        .map(|i| OpenDocument {
            id: i.id,
            kind: DocumentKind::SupplierInvoice,
            number: i.number,
            partner_name: i.partner_name,
            total: i.total,
            due_date: i.due_date,
        })
        .collect();

    let considered = lines.len();
    let mut matched = 0;

    for line in &lines {
        let pool_for_line = match line.direction {
            Direction::Credit => &receivables,
            Direction::Debit => &payables,
        };

        let Some(candidate) = best_candidate(line, pool_for_line) else {
            continue;
        };

        let (invoice_id, supplier_invoice_id) = match candidate.kind {
            DocumentKind::Invoice => (Some(candidate.document_id), None),
            DocumentKind::SupplierInvoice => (None, Some(candidate.document_id)),
        };

        saldo_storage::update_line_match(
            pool,
            tenant_id,
            line.id,
            candidate.status(),
            Some(candidate.confidence),
            invoice_id,
            supplier_invoice_id,
        )
        .await?;
        matched += 1;
    }

    if statement.status == StatementStatus::Imported && considered > 0 {
        saldo_storage::set_statement_status(
            pool,
            tenant_id,
            statement_id,
            StatementStatus::Reconciling,
        )
        .await?;
    }

    info!(tenant_id, statement_id, matched, considered, "auto-match finished");

    Ok(MatchSummary { matched, considered })
}
