use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Money;

/// File format detected at upload time, from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    Xml,
    Csv,
    /// Accepted but never auto-parsed; left for manual handling.
    Pdf,
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::Xml => "xml",
            FileFormat::Csv => "csv",
            FileFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xml" => Ok(FileFormat::Xml),
            "csv" => Ok(FileFormat::Csv),
            "pdf" => Ok(FileFormat::Pdf),
            other => Err(format!("unknown file format: '{other}'")),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStatus {
    Pending,
    Processing,
    Parsed,
    Matched,
    Error,
    Quarantine,
}

impl ImportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportStatus::Pending => "pending",
            ImportStatus::Processing => "processing",
            ImportStatus::Parsed => "parsed",
            ImportStatus::Matched => "matched",
            ImportStatus::Error => "error",
            ImportStatus::Quarantine => "quarantine",
        }
    }
}

impl FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ImportStatus::Pending),
            "processing" => Ok(ImportStatus::Processing),
            "parsed" => Ok(ImportStatus::Parsed),
            "matched" => Ok(ImportStatus::Matched),
            "error" => Ok(ImportStatus::Error),
            "quarantine" => Ok(ImportStatus::Quarantine),
            other => Err(format!("unknown import status: '{other}'")),
        }
    }
}

/// Direction of a statement line, from the bank account's perspective.
/// Credit is inbound funds, debit is outbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Credit => "credit",
            Direction::Debit => "debit",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Direction::Credit),
            "debit" => Ok(Direction::Debit),
            other => Err(format!("unknown direction: '{other}'")),
        }
    }
}

/// Match lifecycle of a statement line. Posting is not a status of its own;
/// a posted line is one whose journal entry id is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Unmatched,
    Suggested,
    Matched,
    ManuallyMatched,
    Excluded,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Unmatched => "unmatched",
            MatchStatus::Suggested => "suggested",
            MatchStatus::Matched => "matched",
            MatchStatus::ManuallyMatched => "manually_matched",
            MatchStatus::Excluded => "excluded",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unmatched" => Ok(MatchStatus::Unmatched),
            "suggested" => Ok(MatchStatus::Suggested),
            "matched" => Ok(MatchStatus::Matched),
            "manually_matched" => Ok(MatchStatus::ManuallyMatched),
            "excluded" => Ok(MatchStatus::Excluded),
            other => Err(format!("unknown match status: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementStatus {
    Imported,
    Reconciling,
    Reconciled,
}

impl StatementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementStatus::Imported => "imported",
            StatementStatus::Reconciling => "reconciling",
            StatementStatus::Reconciled => "reconciled",
        }
    }
}

impl FromStr for StatementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "imported" => Ok(StatementStatus::Imported),
            "reconciling" => Ok(StatementStatus::Reconciling),
            "reconciled" => Ok(StatementStatus::Reconciled),
            other => Err(format!("unknown statement status: '{other}'")),
        }
    }
}

/// Which side of the books a match candidate lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Invoice,
    SupplierInvoice,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::SupplierInvoice => "supplier_invoice",
        }
    }

    /// The line direction this document kind may legally match.
    pub fn direction(self) -> Direction {
        match self {
            DocumentKind::Invoice => Direction::Credit,
            DocumentKind::SupplierInvoice => Direction::Debit,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Overdue,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "paid" => Ok(InvoiceStatus::Paid),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(format!("unknown invoice status: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplierInvoiceStatus {
    Received,
    Approved,
    Paid,
    Rejected,
}

impl SupplierInvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SupplierInvoiceStatus::Received => "received",
            SupplierInvoiceStatus::Approved => "approved",
            SupplierInvoiceStatus::Paid => "paid",
            SupplierInvoiceStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for SupplierInvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(SupplierInvoiceStatus::Received),
            "approved" => Ok(SupplierInvoiceStatus::Approved),
            "paid" => Ok(SupplierInvoiceStatus::Paid),
            "rejected" => Ok(SupplierInvoiceStatus::Rejected),
            other => Err(format!("unknown supplier invoice status: '{other}'")),
        }
    }
}

/// One uploaded bank file. `(tenant_id, content_hash)` is unique; a
/// byte-identical re-upload never creates a second row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentImport {
    pub id: i64,
    pub tenant_id: i64,
    pub filename: String,
    /// `None` when the extension resolved to no known format.
    pub format: Option<FileFormat>,
    pub file_size: i64,
    pub content_hash: String,
    pub status: ImportStatus,
    pub bank_account_id: Option<i64>,
    pub transaction_count: i64,
    pub error_message: Option<String>,
    pub imported_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankStatement {
    pub id: i64,
    pub tenant_id: i64,
    pub bank_account_id: Option<i64>,
    pub statement_date: NaiveDate,
    pub statement_number: String,
    pub currency: String,
    pub closing_balance: Money,
    pub status: StatementStatus,
}

/// A canonical parsed statement line, ready for insertion. Both parsers
/// emit this shape; `amount` is always a non-negative magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStatementLine {
    pub line_date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub direction: Direction,
    pub counterparty_name: Option<String>,
    pub counterparty_account: Option<String>,
    pub reference: Option<String>,
    pub purpose: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementLine {
    pub id: i64,
    pub tenant_id: i64,
    pub statement_id: i64,
    pub line_date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub direction: Direction,
    pub counterparty_name: Option<String>,
    pub counterparty_account: Option<String>,
    pub reference: Option<String>,
    pub purpose: Option<String>,
    pub match_status: MatchStatus,
    pub match_confidence: Option<i64>,
    pub matched_invoice_id: Option<i64>,
    pub matched_supplier_invoice_id: Option<i64>,
    pub journal_entry_id: Option<i64>,
}

impl StatementLine {
    /// Set if and only if the line has been posted.
    pub fn is_posted(&self) -> bool {
        self.journal_entry_id.is_some()
    }

    pub fn matched_document(&self) -> Option<(DocumentKind, i64)> {
        match (self.matched_invoice_id, self.matched_supplier_invoice_id) {
            (Some(id), None) => Some((DocumentKind::Invoice, id)),
            (None, Some(id)) => Some((DocumentKind::SupplierInvoice, id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub tenant_id: i64,
    pub number: String,
    pub partner_name: String,
    pub total: Money,
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierInvoice {
    pub id: i64,
    pub tenant_id: i64,
    pub number: String,
    pub partner_name: String,
    pub total: Money,
    pub due_date: Option<NaiveDate>,
    pub status: SupplierInvoiceStatus,
}

/// A tenant-configured posting rule: which ledger accounts a given payment
/// model posts to. Absence of a rule is not an error; posting falls back to
/// the fixed bank/control skeleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingRule {
    pub payment_model: String,
    pub debit_account: String,
    pub credit_account: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_text_round_trips() {
        for status in [
            MatchStatus::Unmatched,
            MatchStatus::Suggested,
            MatchStatus::Matched,
            MatchStatus::ManuallyMatched,
            MatchStatus::Excluded,
        ] {
            assert_eq!(status.as_str().parse::<MatchStatus>().unwrap(), status);
        }
        assert_eq!("xml".parse::<FileFormat>().unwrap(), FileFormat::Xml);
        assert!("ofx".parse::<FileFormat>().is_err());
    }

    #[test]
    fn document_kind_polarity() {
        assert_eq!(DocumentKind::Invoice.direction(), Direction::Credit);
        assert_eq!(DocumentKind::SupplierInvoice.direction(), Direction::Debit);
    }

    fn line_with(invoice: Option<i64>, supplier: Option<i64>) -> StatementLine {
        StatementLine {
            id: 1,
            tenant_id: 1,
            statement_id: 1,
            line_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            description: "Uplata".to_string(),
            amount: Money::from_cents(5_000_000),
            direction: Direction::Credit,
            counterparty_name: None,
            counterparty_account: None,
            reference: None,
            purpose: None,
            match_status: MatchStatus::Matched,
            match_confidence: Some(95),
            matched_invoice_id: invoice,
            matched_supplier_invoice_id: supplier,
            journal_entry_id: None,
        }
    }

    #[test]
    fn matched_document_requires_exactly_one_side() {
        assert_eq!(
            line_with(Some(7), None).matched_document(),
            Some((DocumentKind::Invoice, 7))
        );
        assert_eq!(
            line_with(None, Some(9)).matched_document(),
            Some((DocumentKind::SupplierInvoice, 9))
        );
        assert_eq!(line_with(None, None).matched_document(), None);
        assert_eq!(line_with(Some(7), Some(9)).matched_document(), None);
    }
}
