use saldo_core::{DocumentImport, FileFormat, ImportStatus};

use crate::db::DbPool;

pub struct NewDocumentImport<'a> {
    pub tenant_id: i64,
    pub filename: &'a str,
    pub format: Option<FileFormat>,
    pub file_size: i64,
    pub content_hash: &'a str,
    pub bank_account_id: Option<i64>,
}

type ImportRow = (
    i64,
    i64,
    String,
    Option<String>,
    i64,
    String,
    String,
    Option<i64>,
    i64,
    Option<String>,
    String,
);

const IMPORT_COLUMNS: &str = "id, tenant_id, filename, format, file_size, content_hash, status, \
     bank_account_id, transaction_count, error_message, imported_at";

fn map_import(r: ImportRow) -> DocumentImport {
    DocumentImport {
        id: r.0,
        tenant_id: r.1,
        filename: r.2,
        format: r.3.as_deref().and_then(|s| s.parse().ok()),
        file_size: r.4,
        content_hash: r.5,
        status: r.6.parse().unwrap_or(ImportStatus::Pending),
        bank_account_id: r.7,
        transaction_count: r.8,
        error_message: r.9,
        imported_at: r.10,
    }
}

/// Insert a new import row with status `pending`.
pub async fn insert_import(
    pool: &DbPool,
    import: &NewDocumentImport<'_>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO document_imports \
         (tenant_id, filename, format, file_size, content_hash, bank_account_id) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(import.tenant_id)
    .bind(import.filename)
    .bind(import.format.map(FileFormat::as_str))
    .bind(import.file_size)
    .bind(import.content_hash)
    .bind(import.bank_account_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn find_import_by_hash(
    pool: &DbPool,
    tenant_id: i64,
    content_hash: &str,
) -> Result<Option<DocumentImport>, sqlx::Error> {
    let row = sqlx::query_as::<_, ImportRow>(&format!(
        "SELECT {IMPORT_COLUMNS} FROM document_imports WHERE tenant_id = ? AND content_hash = ?"
    ))
    .bind(tenant_id)
    .bind(content_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(map_import))
}

pub async fn get_import(
    pool: &DbPool,
    tenant_id: i64,
    import_id: i64,
) -> Result<Option<DocumentImport>, sqlx::Error> {
    let row = sqlx::query_as::<_, ImportRow>(&format!(
        "SELECT {IMPORT_COLUMNS} FROM document_imports WHERE tenant_id = ? AND id = ?"
    ))
    .bind(tenant_id)
    .bind(import_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(map_import))
}

pub async fn set_import_status(
    pool: &DbPool,
    tenant_id: i64,
    import_id: i64,
    status: ImportStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE document_imports SET status = ? WHERE tenant_id = ? AND id = ?")
        .bind(status.as_str())
        .bind(tenant_id)
        .bind(import_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_import_parsed(
    pool: &DbPool,
    tenant_id: i64,
    import_id: i64,
    transaction_count: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE document_imports SET status = 'parsed', transaction_count = ?, \
         error_message = NULL WHERE tenant_id = ? AND id = ?",
    )
    .bind(transaction_count)
    .bind(tenant_id)
    .bind(import_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_import_error(
    pool: &DbPool,
    tenant_id: i64,
    import_id: i64,
    message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE document_imports SET status = 'error', error_message = ? \
         WHERE tenant_id = ? AND id = ?",
    )
    .bind(message)
    .bind(tenant_id)
    .bind(import_id)
    .execute(pool)
    .await?;
    Ok(())
}
