pub mod db;
pub mod documents;
pub mod imports;
pub mod journal;
pub mod statements;

pub use db::{create_db, create_memory_db, DbPool};
pub use documents::{
    get_invoice, get_open_invoices, get_open_supplier_invoices, get_posting_rule,
    get_supplier_invoice, insert_invoice, insert_supplier_invoice, mark_invoice_paid,
    mark_supplier_invoice_paid, upsert_posting_rule,
};
pub use imports::{
    find_import_by_hash, get_import, insert_import, mark_import_error, mark_import_parsed,
    set_import_status, NewDocumentImport,
};
pub use journal::{
    create_journal_entry, create_journal_entry_for_line, get_entry_lines, get_entry_total,
    JournalError,
};
pub use statements::{
    bulk_confirm_suggested, get_line, get_lines, get_lines_with_status, get_postable_lines,
    get_statement, insert_statement_with_lines, set_statement_status, update_line_match,
    NewBankStatement,
};
