use chrono::NaiveDate;
use saldo_core::{
    BankStatement, Direction, MatchStatus, Money, NewStatementLine, StatementLine, StatementStatus,
};

use crate::db::DbPool;

pub struct NewBankStatement<'a> {
    pub tenant_id: i64,
    pub bank_account_id: Option<i64>,
    pub statement_date: NaiveDate,
    pub statement_number: &'a str,
    pub currency: &'a str,
    pub closing_balance: Money,
}

type LineRow = (
    i64,
    i64,
    i64,
    NaiveDate,
    String,
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
);

const LINE_COLUMNS: &str = "id, tenant_id, statement_id, line_date, description, amount_cents, \
     direction, counterparty_name, counterparty_account, reference, purpose, match_status, \
     match_confidence, matched_invoice_id, matched_supplier_invoice_id, journal_entry_id";

fn map_line(r: LineRow) -> StatementLine {
    StatementLine {
        id: r.0,
        tenant_id: r.1,
        statement_id: r.2,
        line_date: r.3,
        description: r.4,
        amount: Money::from_cents(r.5),
        direction: r.6.parse().unwrap_or(Direction::Credit),
        counterparty_name: r.7,
        counterparty_account: r.8,
        reference: r.9,
        purpose: r.10,
        match_status: r.11.parse().unwrap_or(MatchStatus::Unmatched),
        match_confidence: r.12,
        matched_invoice_id: r.13,
        matched_supplier_invoice_id: r.14,
        journal_entry_id: r.15,
    }
}

/// Create a statement and all of its lines in one transaction. Either the
/// whole batch lands or nothing does.
pub async fn insert_statement_with_lines(
    pool: &DbPool,
    statement: &NewBankStatement<'_>,
    lines: &[NewStatementLine],
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row: (i64,) = sqlx::query_as(
        "INSERT INTO bank_statements \
         (tenant_id, bank_account_id, statement_date, statement_number, currency, closing_balance_cents) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(statement.tenant_id)
    .bind(statement.bank_account_id)
    .bind(statement.statement_date)
    .bind(statement.statement_number)
    .bind(statement.currency)
    .bind(statement.closing_balance.to_cents())
    .fetch_one(&mut *tx)
    .await?;
    let statement_id = row.0;

    for line in lines {
        sqlx::query(
            "INSERT INTO statement_lines \
             (tenant_id, statement_id, line_date, description, amount_cents, direction, \
              counterparty_name, counterparty_account, reference, purpose) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(statement.tenant_id)
        .bind(statement_id)
        .bind(line.line_date)
        .bind(&line.description)
        .bind(line.amount.to_cents())
        .bind(line.direction.as_str())
        .bind(&line.counterparty_name)
        .bind(&line.counterparty_account)
        .bind(&line.reference)
        .bind(&line.purpose)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(statement_id)
}

pub async fn get_statement(
    pool: &DbPool,
    tenant_id: i64,
    statement_id: i64,
) -> Result<Option<BankStatement>, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64, i64, Option<i64>, NaiveDate, String, String, i64, String)>(
        "SELECT id, tenant_id, bank_account_id, statement_date, statement_number, currency, \
         closing_balance_cents, status FROM bank_statements WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant_id)
    .bind(statement_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| BankStatement {
        id: r.0,
        tenant_id: r.1,
        bank_account_id: r.2,
        statement_date: r.3,
        statement_number: r.4,
        currency: r.5,
        closing_balance: Money::from_cents(r.6),
        status: r.7.parse().unwrap_or(StatementStatus::Imported),
    }))
}

pub async fn set_statement_status(
    pool: &DbPool,
    tenant_id: i64,
    statement_id: i64,
    status: StatementStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE bank_statements SET status = ? WHERE tenant_id = ? AND id = ?")
        .bind(status.as_str())
        .bind(tenant_id)
        .bind(statement_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// All lines of a statement, ordered by line date.
pub async fn get_lines(
    pool: &DbPool,
    tenant_id: i64,
    statement_id: i64,
) -> Result<Vec<StatementLine>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LineRow>(&format!(
        "SELECT {LINE_COLUMNS} FROM statement_lines \
         WHERE tenant_id = ? AND statement_id = ? ORDER BY line_date, id"
    ))
    .bind(tenant_id)
    .bind(statement_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(map_line).collect())
}

pub async fn get_lines_with_status(
    pool: &DbPool,
    tenant_id: i64,
    statement_id: i64,
    status: MatchStatus,
) -> Result<Vec<StatementLine>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LineRow>(&format!(
        "SELECT {LINE_COLUMNS} FROM statement_lines \
         WHERE tenant_id = ? AND statement_id = ? AND match_status = ? ORDER BY line_date, id"
    ))
    .bind(tenant_id)
    .bind(statement_id)
    .bind(status.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(map_line).collect())
}

/// Lines eligible for posting: confirmed matches that have not been posted.
pub async fn get_postable_lines(
    pool: &DbPool,
    tenant_id: i64,
    statement_id: i64,
) -> Result<Vec<StatementLine>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LineRow>(&format!(
        "SELECT {LINE_COLUMNS} FROM statement_lines \
         WHERE tenant_id = ? AND statement_id = ? \
         AND match_status IN ('matched', 'manually_matched') \
         AND journal_entry_id IS NULL ORDER BY line_date, id"
    ))
    .bind(tenant_id)
    .bind(statement_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(map_line).collect())
}

pub async fn get_line(
    pool: &DbPool,
    tenant_id: i64,
    line_id: i64,
) -> Result<Option<StatementLine>, sqlx::Error> {
    let row = sqlx::query_as::<_, LineRow>(&format!(
        "SELECT {LINE_COLUMNS} FROM statement_lines WHERE tenant_id = ? AND id = ?"
    ))
    .bind(tenant_id)
    .bind(line_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(map_line))
}

/// Persist a match decision: status, confidence, and at most one matched
/// document id.
pub async fn update_line_match(
    pool: &DbPool,
    tenant_id: i64,
    line_id: i64,
    status: MatchStatus,
    confidence: Option<i64>,
    matched_invoice_id: Option<i64>,
    matched_supplier_invoice_id: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE statement_lines SET match_status = ?, match_confidence = ?, \
         matched_invoice_id = ?, matched_supplier_invoice_id = ? \
         WHERE tenant_id = ? AND id = ?",
    )
    .bind(status.as_str())
    .bind(confidence)
    .bind(matched_invoice_id)
    .bind(matched_supplier_invoice_id)
    .bind(tenant_id)
    .bind(line_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Promote every `suggested` line of a statement to `matched`. Returns the
/// number of lines affected.
pub async fn bulk_confirm_suggested(
    pool: &DbPool,
    tenant_id: i64,
    statement_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE statement_lines SET match_status = 'matched' \
         WHERE tenant_id = ? AND statement_id = ? AND match_status = 'suggested'",
    )
    .bind(tenant_id)
    .bind(statement_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_db;
    use saldo_core::Direction;

    fn new_line(day: u32, cents: i64, direction: Direction) -> NewStatementLine {
        NewStatementLine {
            line_date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            description: "tx".to_string(),
            amount: Money::from_cents(cents),
            direction,
            counterparty_name: None,
            counterparty_account: None,
            reference: None,
            purpose: None,
        }
    }

    #[tokio::test]
    async fn statement_round_trip_with_ordered_lines() {
        let pool = create_memory_db().await.unwrap();
        let id = insert_statement_with_lines(
            &pool,
            &NewBankStatement {
                tenant_id: 1,
                bank_account_id: Some(4),
                statement_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
                statement_number: "17",
                currency: "RSD",
                closing_balance: Money::from_cents(7_500),
            },
            &[
                new_line(20, 2_500, Direction::Debit),
                new_line(10, 10_000, Direction::Credit),
            ],
        )
        .await
        .unwrap();

        let statement = get_statement(&pool, 1, id).await.unwrap().unwrap();
        assert_eq!(statement.status, StatementStatus::Imported);
        assert_eq!(statement.closing_balance.to_cents(), 7_500);

        let lines = get_lines(&pool, 1, id).await.unwrap();
        assert_eq!(lines.len(), 2);
        // Ordered by line date, not insertion order.
        assert_eq!(lines[0].line_date, NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
        assert_eq!(lines[0].match_status, MatchStatus::Unmatched);
        assert!(!lines[0].is_posted());
    }

    #[tokio::test]
    async fn lines_are_tenant_scoped() {
        let pool = create_memory_db().await.unwrap();
        let id = insert_statement_with_lines(
            &pool,
            &NewBankStatement {
                tenant_id: 1,
                bank_account_id: None,
                statement_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
                statement_number: "17",
                currency: "RSD",
                closing_balance: Money::zero(),
            },
            &[new_line(10, 100, Direction::Credit)],
        )
        .await
        .unwrap();

        assert!(get_statement(&pool, 2, id).await.unwrap().is_none());
        assert!(get_lines(&pool, 2, id).await.unwrap().is_empty());
    }
}
