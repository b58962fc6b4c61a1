use saldo_core::{
    Direction, DocumentKind, JournalLine, MatchStatus, PostingRule, StatementLine, StatementStatus,
    UnvalidatedEntry,
};
use saldo_storage::DbPool;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::EngineError;

/// The fixed account skeleton used when no posting rule covers a line's
/// payment model. Codes come from the tenant's chart of accounts.
#[derive(Debug, Clone)]
pub struct PostingContext {
    pub bank_account: String,
    pub receivable_account: String,
    pub payable_account: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostingSummary {
    pub posted: usize,
    pub failed: usize,
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(rename = "rule")]
    rules: Vec<PostingRule>,
}

/// Parse a `[[rule]]` TOML document into posting rules.
pub fn parse_rules_toml(content: &str) -> Result<Vec<PostingRule>, EngineError> {
    let file: RulesFile =
        toml::from_str(content).map_err(|e| EngineError::InvalidRules(e.to_string()))?;
    Ok(file.rules)
}

/// Load a TOML rule file and upsert every rule for the tenant. Re-seeding
/// with an edited file updates rules in place.
pub async fn seed_posting_rules(
    pool: &DbPool,
    tenant_id: i64,
    content: &str,
) -> Result<usize, EngineError> {
    let rules = parse_rules_toml(content)?;
    for rule in &rules {
        saldo_storage::upsert_posting_rule(pool, tenant_id, rule).await?;
    }
    info!(tenant_id, count = rules.len(), "posting rules seeded");
    Ok(rules.len())
}

/// Accounts a line posts to: rule-driven when a payment model is given and a
/// rule exists, otherwise the direction-based bank/control fallback.
async fn resolve_accounts(
    pool: &DbPool,
    tenant_id: i64,
    line: &StatementLine,
    payment_model: Option<&str>,
    ctx: &PostingContext,
) -> Result<(String, String), sqlx::Error> {
    if let Some(model) = payment_model {
        if let Some(rule) = saldo_storage::get_posting_rule(pool, tenant_id, model).await? {
            return Ok((rule.debit_account, rule.credit_account));
        }
    }

    Ok(match line.direction {
        // Money in: debit the bank, relieve receivables.
        Direction::Credit => (ctx.bank_account.clone(), ctx.receivable_account.clone()),
        // Money out: relieve payables, credit the bank.
        Direction::Debit => (ctx.payable_account.clone(), ctx.bank_account.clone()),
    })
}

/// Post one statement line to the ledger. Writes a balanced two-line journal
/// entry, claims the line, and flips a matched document to `paid`. The claim
/// and the entry share a transaction, so a concurrent posting of the same
/// line leaves exactly one entry behind and the loser gets `AlreadyPosted`.
/// Excluded lines are terminal and suggestions must be confirmed first;
/// neither is postable.
pub async fn post_line(
    pool: &DbPool,
    tenant_id: i64,
    line_id: i64,
    payment_model: Option<&str>,
    ctx: &PostingContext,
) -> Result<i64, EngineError> {
    let line = saldo_storage::get_line(pool, tenant_id, line_id)
        .await?
        .ok_or(EngineError::LineNotFound(line_id))?;

    if line.is_posted() {
        return Err(EngineError::AlreadyPosted(line_id));
    }
    if matches!(line.match_status, MatchStatus::Excluded | MatchStatus::Suggested) {
        return Err(EngineError::NotPostable {
            line_id,
            status: line.match_status.as_str(),
        });
    }

    let (debit_account, credit_account) =
        resolve_accounts(pool, tenant_id, &line, payment_model, ctx).await?;

    let entry = UnvalidatedEntry {
        entry_date: line.line_date,
        description: line.description.clone(),
        reference: line.reference.clone(),
        lines: vec![
            JournalLine::debit(debit_account, line.amount, None),
            JournalLine::credit(credit_account, line.amount, None),
        ],
    };

    let entry_id = saldo_storage::create_journal_entry_for_line(pool, tenant_id, line_id, entry)
        .await?
        .ok_or(EngineError::AlreadyPosted(line_id))?;

    if let Some((kind, document_id)) = line.matched_document() {
        let transitioned = match kind {
            DocumentKind::Invoice => {
                saldo_storage::mark_invoice_paid(pool, tenant_id, document_id).await?
            }
            DocumentKind::SupplierInvoice => {
                saldo_storage::mark_supplier_invoice_paid(pool, tenant_id, document_id).await?
            }
        };
        if !transitioned {
            warn!(tenant_id, line_id, %kind, document_id, "document was already paid");
        }
    }

    info!(tenant_id, line_id, entry_id, "line posted");
    Ok(entry_id)
}

/// Post every confirmed line of a statement. Failures are counted per line,
/// never aborting the batch; a failed line stays postable after the cause is
/// fixed. The statement moves to `reconciled` once something posted, unless
/// `strict` demands a clean batch.
pub async fn post_all_matched(
    pool: &DbPool,
    tenant_id: i64,
    statement_id: i64,
    payment_model: Option<&str>,
    ctx: &PostingContext,
    strict: bool,
) -> Result<PostingSummary, EngineError> {
    saldo_storage::get_statement(pool, tenant_id, statement_id)
        .await?
        .ok_or(EngineError::StatementNotFound(statement_id))?;

    let lines = saldo_storage::get_postable_lines(pool, tenant_id, statement_id).await?;

    let mut summary = PostingSummary::default();
    for line in &lines {
        match post_line(pool, tenant_id, line.id, payment_model, ctx).await {
            Ok(_) => summary.posted += 1,
            Err(e) => {
                warn!(tenant_id, statement_id, line_id = line.id, error = %e, "posting failed");
                summary.failed += 1;
            }
        }
    }

    if summary.posted > 0 && (!strict || summary.failed == 0) {
        saldo_storage::set_statement_status(
            pool,
            tenant_id,
            statement_id,
            StatementStatus::Reconciled,
        )
        .await?;
    }

    info!(
        tenant_id,
        statement_id,
        posted = summary.posted,
        failed = summary.failed,
        "batch posting finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_toml_parses_rule_tables() {
        let content = r#"
            [[rule]]
            payment_model = "297"
            debit_account = "2410"
            credit_account = "2040"
            description = "Domestic payment"

            [[rule]]
            payment_model = "254"
            debit_account = "4350"
            credit_account = "2410"
        "#;
        let rules = parse_rules_toml(content).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].payment_model, "297");
        assert!(rules[1].description.is_none());
    }

    #[test]
    fn bad_rules_toml_is_rejected() {
        let result = parse_rules_toml("[[rule]]\npayment_model = \"297\"");
        assert!(matches!(result, Err(EngineError::InvalidRules(_))));
    }
}
