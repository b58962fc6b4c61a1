pub mod domain;
pub mod journal;
pub mod money;

pub use domain::{
    BankStatement, Direction, DocumentImport, DocumentKind, FileFormat, ImportStatus, Invoice,
    InvoiceStatus, MatchStatus, NewStatementLine, PostingRule, StatementLine, StatementStatus,
    SupplierInvoice, SupplierInvoiceStatus,
};
pub use journal::{JournalLine, LedgerError, UnvalidatedEntry, ValidatedEntry};
pub use money::Money;
