use saldo_core::{JournalLine, LedgerError, Money, UnvalidatedEntry, ValidatedEntry};
use thiserror::Error;

use crate::db::DbPool;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

async fn insert_entry(
    conn: &mut sqlx::SqliteConnection,
    tenant_id: i64,
    entry: &ValidatedEntry,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO journal_entries (tenant_id, entry_date, reference, description) \
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(tenant_id)
    .bind(entry.entry_date)
    .bind(&entry.reference)
    .bind(&entry.description)
    .fetch_one(&mut *conn)
    .await?;
    let entry_id = row.0;

    for line in &entry.lines {
        sqlx::query(
            "INSERT INTO journal_entry_lines \
             (entry_id, account_code, debit_cents, credit_cents, description) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry_id)
        .bind(&line.account_code)
        .bind(line.debit.to_cents())
        .bind(line.credit.to_cents())
        .bind(&line.description)
        .execute(&mut *conn)
        .await?;
    }

    Ok(entry_id)
}

/// The journal-entry primitive: validates that the lines balance, then
/// persists the header and lines in one transaction.
pub async fn create_journal_entry(
    pool: &DbPool,
    tenant_id: i64,
    entry: UnvalidatedEntry,
) -> Result<i64, JournalError> {
    let validated = ValidatedEntry::validate(entry)?;

    let mut tx = pool.begin().await?;
    let entry_id = insert_entry(&mut tx, tenant_id, &validated).await?;
    tx.commit().await?;

    Ok(entry_id)
}

/// Post a statement line: create the journal entry and claim the line's
/// `journal_entry_id` in the same transaction. The conditional update is the
/// optimistic lock against double posting; when another writer got there
/// first the entry is rolled back and `None` is returned.
pub async fn create_journal_entry_for_line(
    pool: &DbPool,
    tenant_id: i64,
    line_id: i64,
    entry: UnvalidatedEntry,
) -> Result<Option<i64>, JournalError> {
    let validated = ValidatedEntry::validate(entry)?;

    let mut tx = pool.begin().await?;
    let entry_id = insert_entry(&mut tx, tenant_id, &validated).await?;

    let claimed = sqlx::query(
        "UPDATE statement_lines SET journal_entry_id = ? \
         WHERE tenant_id = ? AND id = ? AND journal_entry_id IS NULL",
    )
    .bind(entry_id)
    .bind(tenant_id)
    .bind(line_id)
    .execute(&mut *tx)
    .await?;

    if claimed.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    tx.commit().await?;
    Ok(Some(entry_id))
}

/// Sum of debits (== credits) for an entry; test and audit helper.
pub async fn get_entry_total(
    pool: &DbPool,
    tenant_id: i64,
    entry_id: i64,
) -> Result<Option<Money>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT COALESCE(SUM(l.debit_cents), 0) FROM journal_entry_lines l \
         JOIN journal_entries e ON e.id = l.entry_id \
         WHERE e.tenant_id = ? AND e.id = ? GROUP BY e.id",
    )
    .bind(tenant_id)
    .bind(entry_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Money::from_cents(r.0)))
}

/// Debit/credit line pairs of an entry, for assertions over posted output.
pub async fn get_entry_lines(
    pool: &DbPool,
    tenant_id: i64,
    entry_id: i64,
) -> Result<Vec<JournalLine>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, i64, i64, Option<String>)>(
        "SELECT l.account_code, l.debit_cents, l.credit_cents, l.description \
         FROM journal_entry_lines l \
         JOIN journal_entries e ON e.id = l.entry_id \
         WHERE e.tenant_id = ? AND e.id = ? ORDER BY l.id",
    )
    .bind(tenant_id)
    .bind(entry_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| JournalLine {
            account_code: r.0,
            debit: Money::from_cents(r.1),
            credit: Money::from_cents(r.2),
            description: r.3,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_db;
    use chrono::NaiveDate;

    fn entry(debit_cents: i64, credit_cents: i64) -> UnvalidatedEntry {
        UnvalidatedEntry {
            entry_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            description: "Payment".to_string(),
            reference: None,
            lines: vec![
                JournalLine::debit("2410", Money::from_cents(debit_cents), None),
                JournalLine::credit("2040", Money::from_cents(credit_cents), None),
            ],
        }
    }

    #[tokio::test]
    async fn create_entry_persists_balanced_lines() {
        let pool = create_memory_db().await.unwrap();
        let id = create_journal_entry(&pool, 1, entry(100_000, 100_000))
            .await
            .unwrap();

        let total = get_entry_total(&pool, 1, id).await.unwrap().unwrap();
        assert_eq!(total.to_cents(), 100_000);

        let lines = get_entry_lines(&pool, 1, id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].account_code, "2410");
    }

    #[tokio::test]
    async fn unbalanced_entry_is_refused() {
        let pool = create_memory_db().await.unwrap();
        let result = create_journal_entry(&pool, 1, entry(100_000, 90_000)).await;
        assert!(matches!(
            result,
            Err(JournalError::Ledger(LedgerError::Unbalanced(_, _)))
        ));
    }
}
