use saldo_core::{Direction, Money, NewStatementLine};
use thiserror::Error;

use crate::batch::StatementBatch;
use crate::util::{parse_flexible_amount, parse_flexible_date};

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("no date or amount column found in header: {0}")]
    MissingColumns(String),
    #[error("no data rows")]
    NoDataRows,
}

/// Column roles resolved from the header row by case-insensitive substring
/// matching against a fixed English/Serbian vocabulary.
#[derive(Debug, Default, Clone, PartialEq)]
struct ColumnMap {
    date: Option<usize>,
    amount: Option<usize>,
    direction: Option<usize>,
    reference: Option<usize>,
    purpose: Option<usize>,
    counterparty_account: Option<usize>,
    description: Option<usize>,
    counterparty_name: Option<usize>,
}

const DATE_TOKENS: &[&str] = &["datum", "date"];
const AMOUNT_TOKENS: &[&str] = &["iznos", "amount"];
const DIRECTION_TOKENS: &[&str] = &["smer", "direction", "vrsta", "type"];
const REFERENCE_TOKENS: &[&str] = &["poziv", "reference", "ref"];
const PURPOSE_TOKENS: &[&str] = &["svrha", "purpose"];
const ACCOUNT_TOKENS: &[&str] = &["racun", "račun", "account", "iban"];
const DESCRIPTION_TOKENS: &[&str] = &["opis", "desc"];
const NAME_TOKENS: &[&str] = &["naziv", "partner", "counterparty", "platilac", "name"];

/// Cell values in a direction column that mean "outbound funds". Anything
/// else in that column is treated as credit.
const DEBIT_TOKENS: &[&str] = &["debit", "dug", "isplata", "zaduz", "zaduž", "out"];

impl ColumnMap {
    /// Roles are resolved in a fixed priority order and each header index is
    /// claimed at most once, so "partner account" cannot shadow the
    /// reference column it appears after.
    fn resolve(headers: &csv::StringRecord) -> ColumnMap {
        let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let mut claimed = vec![false; lowered.len()];
        let mut find = |tokens: &[&str]| -> Option<usize> {
            let idx = lowered
                .iter()
                .enumerate()
                .find(|(i, h)| !claimed[*i] && tokens.iter().any(|t| h.contains(t)))
                .map(|(i, _)| i)?;
            claimed[idx] = true;
            Some(idx)
        };

        ColumnMap {
            date: find(DATE_TOKENS),
            amount: find(AMOUNT_TOKENS),
            direction: find(DIRECTION_TOKENS),
            reference: find(REFERENCE_TOKENS),
            purpose: find(PURPOSE_TOKENS),
            counterparty_account: find(ACCOUNT_TOKENS),
            description: find(DESCRIPTION_TOKENS),
            counterparty_name: find(NAME_TOKENS),
        }
    }
}

/// Prefer the semicolon when the header uses it; regional bank exports
/// commonly do.
fn detect_delimiter(data: &[u8]) -> u8 {
    let first_line = data.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn optional_field(record: &csv::StringRecord, col: Option<usize>) -> Option<String> {
    col.and_then(|c| record.get(c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_debit_value(value: &str) -> bool {
    let value = value.to_lowercase();
    DEBIT_TOKENS.iter().any(|t| value.contains(t))
}

/// Parse a delimited statement export. The first line must be a header; the
/// date and amount columns are required, everything else degrades to empty.
/// Ragged rows are skipped, never fatal: an empty or unparsable date, or an
/// unparsable or zero amount, drops the row.
pub fn parse_csv(data: &[u8]) -> Result<StatementBatch, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(data))
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let cols = ColumnMap::resolve(&headers);

    let (date_col, amount_col) = match (cols.date, cols.amount) {
        (Some(d), Some(a)) => (d, a),
        _ => {
            return Err(CsvError::MissingColumns(
                headers.iter().collect::<Vec<_>>().join(","),
            ))
        }
    };

    let mut batch = StatementBatch::new();

    for result in reader.records() {
        let record = result?;
        if record.is_empty() {
            continue;
        }

        let Some(date) = record
            .get(date_col)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(parse_flexible_date)
        else {
            continue;
        };

        let raw_amount = record.get(amount_col).unwrap_or_default();
        let Some(decimal) = parse_flexible_amount(raw_amount) else {
            continue;
        };
        if decimal.is_zero() {
            continue;
        }

        // Explicit direction column wins; otherwise the sign of the raw
        // amount decides.
        let direction = match optional_field(&record, cols.direction) {
            Some(value) => {
                if is_debit_value(&value) {
                    Direction::Debit
                } else {
                    Direction::Credit
                }
            }
            None => {
                if decimal.is_sign_negative() {
                    Direction::Debit
                } else {
                    Direction::Credit
                }
            }
        };

        let Some(amount) = Money::from_decimal(decimal.abs()) else {
            continue;
        };

        batch.push(NewStatementLine {
            line_date: date,
            description: optional_field(&record, cols.description).unwrap_or_default(),
            amount,
            direction,
            counterparty_name: optional_field(&record, cols.counterparty_name),
            counterparty_account: optional_field(&record, cols.counterparty_account),
            reference: optional_field(&record, cols.reference),
            purpose: optional_field(&record, cols.purpose),
        });
    }

    if batch.lines.is_empty() {
        return Err(CsvError::NoDataRows);
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── column resolution ─────────────────────────────────────────────────────

    fn headers(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn resolve_english_headers() {
        let cols = ColumnMap::resolve(&headers(&[
            "date", "desc", "amount", "direction", "partner", "reference",
        ]));
        assert_eq!(cols.date, Some(0));
        assert_eq!(cols.description, Some(1));
        assert_eq!(cols.amount, Some(2));
        assert_eq!(cols.direction, Some(3));
        assert_eq!(cols.counterparty_name, Some(4));
        assert_eq!(cols.reference, Some(5));
    }

    #[test]
    fn resolve_serbian_headers() {
        let cols = ColumnMap::resolve(&headers(&[
            "Datum valute",
            "Opis transakcije",
            "Iznos",
            "Naziv partnera",
            "Racun partnera",
            "Poziv na broj",
            "Svrha placanja",
        ]));
        assert_eq!(cols.date, Some(0));
        assert_eq!(cols.description, Some(1));
        assert_eq!(cols.amount, Some(2));
        assert_eq!(cols.counterparty_name, Some(3));
        assert_eq!(cols.counterparty_account, Some(4));
        assert_eq!(cols.reference, Some(5));
        assert_eq!(cols.purpose, Some(6));
        assert_eq!(cols.direction, None);
    }

    #[test]
    fn header_claimed_once() {
        // "poziv na broj" must go to reference, not get eaten by a later role.
        let cols = ColumnMap::resolve(&headers(&["datum", "iznos", "poziv na broj"]));
        assert_eq!(cols.reference, Some(2));
        assert_eq!(cols.counterparty_name, None);
    }

    // ── full parse ────────────────────────────────────────────────────────────

    #[test]
    fn parse_basic_csv() {
        let data = b"date,desc,amount,direction,partner,reference\n\
            2026-01-15,Uplata,50000,credit,Firma DOO,INV-2026-00001\n\
            2026-01-16,Provizija,125.50,debit,Banka,\n";
        let batch = parse_csv(data).unwrap();
        assert_eq!(batch.lines.len(), 2);

        let first = &batch.lines[0];
        assert_eq!(first.amount.to_cents(), 5_000_000);
        assert_eq!(first.direction, Direction::Credit);
        assert_eq!(first.counterparty_name.as_deref(), Some("Firma DOO"));
        assert_eq!(first.reference.as_deref(), Some("INV-2026-00001"));

        assert_eq!(batch.lines[1].direction, Direction::Debit);
        assert_eq!(batch.closing_balance().to_cents(), 5_000_000 - 12_550);
    }

    #[test]
    fn direction_from_sign_when_no_column() {
        let data = b"datum,opis,iznos\n\
            15.01.2026,Uplata,\"50.000,00\"\n\
            16.01.2026,Isplata,\"-2.500,00\"\n";
        let batch = parse_csv(data).unwrap();
        assert_eq!(batch.lines[0].direction, Direction::Credit);
        assert_eq!(batch.lines[1].direction, Direction::Debit);
        // Magnitudes only.
        assert_eq!(batch.lines[1].amount.to_cents(), 250_000);
    }

    #[test]
    fn serbian_direction_tokens() {
        let data = b"datum,iznos,vrsta\n\
            2026-01-15,100,Isplata\n\
            2026-01-16,100,Uplata\n";
        let batch = parse_csv(data).unwrap();
        assert_eq!(batch.lines[0].direction, Direction::Debit);
        assert_eq!(batch.lines[1].direction, Direction::Credit);
    }

    #[test]
    fn semicolon_delimiter_detected() {
        let data = b"datum;opis;iznos\n2026-01-15;Uplata;1000,00\n";
        let batch = parse_csv(data).unwrap();
        assert_eq!(batch.lines[0].amount.to_cents(), 100_000);
    }

    #[test]
    fn ragged_rows_skipped_silently() {
        let data = b"date,amount\n\
            ,100\n\
            2026-01-15,\n\
            2026-01-16,zero\n\
            2026-01-17,0\n\
            2026-01-18,250\n";
        let batch = parse_csv(data).unwrap();
        assert_eq!(batch.lines.len(), 1);
        assert_eq!(batch.lines[0].amount.to_cents(), 25_000);
    }

    #[test]
    fn missing_required_columns_is_fatal() {
        let data = b"opis,naziv\nUplata,Firma\n";
        assert!(matches!(parse_csv(data), Err(CsvError::MissingColumns(_))));
    }

    #[test]
    fn all_rows_skipped_is_no_data() {
        let data = b"date,amount\n,100\n2026-01-15,\n";
        assert!(matches!(parse_csv(data), Err(CsvError::NoDataRows)));
    }

    #[test]
    fn totals_match_parsed_lines() {
        let data = b"date,amount\n\
            2026-01-01,100.00\n\
            2026-01-02,-40.00\n\
            2026-01-03,15.50\n";
        let batch = parse_csv(data).unwrap();
        assert_eq!(batch.total_credit.to_cents(), 11_550);
        assert_eq!(batch.total_debit.to_cents(), 4_000);
        assert_eq!(batch.closing_balance().to_cents(), 7_550);
    }
}
