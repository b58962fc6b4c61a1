use chrono::NaiveDate;
use saldo_core::{
    Invoice, InvoiceStatus, Money, PostingRule, SupplierInvoice, SupplierInvoiceStatus,
};

use crate::db::DbPool;

type DocumentRow = (i64, i64, String, String, i64, Option<NaiveDate>, String);

const DOCUMENT_COLUMNS: &str = "id, tenant_id, number, partner_name, total_cents, due_date, status";

fn map_invoice(r: DocumentRow) -> Invoice {
    Invoice {
        id: r.0,
        tenant_id: r.1,
        number: r.2,
        partner_name: r.3,
        total: Money::from_cents(r.4),
        due_date: r.5,
        status: r.6.parse().unwrap_or(InvoiceStatus::Draft),
    }
}

fn map_supplier_invoice(r: DocumentRow) -> SupplierInvoice {
    SupplierInvoice {
        id: r.0,
        tenant_id: r.1,
        number: r.2,
        partner_name: r.3,
        total: Money::from_cents(r.4),
        due_date: r.5,
        status: r.6.parse().unwrap_or(SupplierInvoiceStatus::Received),
    }
}

pub async fn insert_invoice(
    pool: &DbPool,
    tenant_id: i64,
    number: &str,
    partner_name: &str,
    total: Money,
    due_date: Option<NaiveDate>,
    status: InvoiceStatus,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO invoices (tenant_id, number, partner_name, total_cents, due_date, status) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(tenant_id)
    .bind(number)
    .bind(partner_name)
    .bind(total.to_cents())
    .bind(due_date)
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn insert_supplier_invoice(
    pool: &DbPool,
    tenant_id: i64,
    number: &str,
    partner_name: &str,
    total: Money,
    due_date: Option<NaiveDate>,
    status: SupplierInvoiceStatus,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO supplier_invoices \
         (tenant_id, number, partner_name, total_cents, due_date, status) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(tenant_id)
    .bind(number)
    .bind(partner_name)
    .bind(total.to_cents())
    .bind(due_date)
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn get_invoice(
    pool: &DbPool,
    tenant_id: i64,
    invoice_id: i64,
) -> Result<Option<Invoice>, sqlx::Error> {
    let row = sqlx::query_as::<_, DocumentRow>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM invoices WHERE tenant_id = ? AND id = ?"
    ))
    .bind(tenant_id)
    .bind(invoice_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(map_invoice))
}

pub async fn get_supplier_invoice(
    pool: &DbPool,
    tenant_id: i64,
    invoice_id: i64,
) -> Result<Option<SupplierInvoice>, sqlx::Error> {
    let row = sqlx::query_as::<_, DocumentRow>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM supplier_invoices WHERE tenant_id = ? AND id = ?"
    ))
    .bind(tenant_id)
    .bind(invoice_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(map_supplier_invoice))
}

/// Receivables in an open state, eligible as credit-line candidates.
pub async fn get_open_invoices(
    pool: &DbPool,
    tenant_id: i64,
) -> Result<Vec<Invoice>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DocumentRow>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM invoices \
         WHERE tenant_id = ? AND status IN ('sent', 'overdue') ORDER BY id"
    ))
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(map_invoice).collect())
}

/// Payables in an open state, eligible as debit-line candidates.
pub async fn get_open_supplier_invoices(
    pool: &DbPool,
    tenant_id: i64,
) -> Result<Vec<SupplierInvoice>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DocumentRow>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM supplier_invoices \
         WHERE tenant_id = ? AND status IN ('received', 'approved') ORDER BY id"
    ))
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(map_supplier_invoice).collect())
}

/// Flip an invoice to `paid`. The status guard makes the transition
/// exactly-once; returns whether this call performed it.
pub async fn mark_invoice_paid(
    pool: &DbPool,
    tenant_id: i64,
    invoice_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE invoices SET status = 'paid' \
         WHERE tenant_id = ? AND id = ? AND status != 'paid'",
    )
    .bind(tenant_id)
    .bind(invoice_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_supplier_invoice_paid(
    pool: &DbPool,
    tenant_id: i64,
    invoice_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE supplier_invoices SET status = 'paid' \
         WHERE tenant_id = ? AND id = ? AND status != 'paid'",
    )
    .bind(tenant_id)
    .bind(invoice_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn upsert_posting_rule(
    pool: &DbPool,
    tenant_id: i64,
    rule: &PostingRule,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO posting_rules \
         (tenant_id, payment_model, debit_account, credit_account, description) \
         VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT (tenant_id, payment_model) DO UPDATE SET \
         debit_account = excluded.debit_account, credit_account = excluded.credit_account, \
         description = excluded.description",
    )
    .bind(tenant_id)
    .bind(&rule.payment_model)
    .bind(&rule.debit_account)
    .bind(&rule.credit_account)
    .bind(&rule.description)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_posting_rule(
    pool: &DbPool,
    tenant_id: i64,
    payment_model: &str,
) -> Result<Option<PostingRule>, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, String, String, Option<String>)>(
        "SELECT payment_model, debit_account, credit_account, description \
         FROM posting_rules WHERE tenant_id = ? AND payment_model = ?",
    )
    .bind(tenant_id)
    .bind(payment_model)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| PostingRule {
        payment_model: r.0,
        debit_account: r.1,
        credit_account: r.2,
        description: r.3,
    }))
}
