use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::money::Money;

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("unbalanced entry: debits={0}, credits={1}")]
    Unbalanced(Money, Money),
    #[error("journal entry must have at least two lines")]
    EmptyEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_code: String,
    pub debit: Money,
    pub credit: Money,
    pub description: Option<String>,
}

impl JournalLine {
    pub fn debit(account_code: impl Into<String>, amount: Money, description: Option<String>) -> Self {
        JournalLine {
            account_code: account_code.into(),
            debit: amount,
            credit: Money::zero(),
            description,
        }
    }

    pub fn credit(account_code: impl Into<String>, amount: Money, description: Option<String>) -> Self {
        JournalLine {
            account_code: account_code.into(),
            debit: Money::zero(),
            credit: amount,
            description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnvalidatedEntry {
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub lines: Vec<JournalLine>,
}

impl UnvalidatedEntry {
    pub fn total_debits(&self) -> Money {
        self.lines
            .iter()
            .map(|l| l.debit)
            .fold(Money::zero(), |a, b| a + b)
    }

    pub fn total_credits(&self) -> Money {
        self.lines
            .iter()
            .map(|l| l.credit)
            .fold(Money::zero(), |a, b| a + b)
    }
}

/// A journal entry whose lines are known to balance. The only way to obtain
/// one is through [`ValidatedEntry::validate`], so anything persisting a
/// `ValidatedEntry` can rely on sum(debit) == sum(credit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedEntry {
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub lines: Vec<JournalLine>,
    pub balanced_total: Money,
}

impl ValidatedEntry {
    pub fn validate(entry: UnvalidatedEntry) -> Result<ValidatedEntry, LedgerError> {
        if entry.lines.len() < 2 {
            return Err(LedgerError::EmptyEntry);
        }

        let total_debits = entry.total_debits();
        let total_credits = entry.total_credits();

        if total_debits != total_credits {
            return Err(LedgerError::Unbalanced(total_debits, total_credits));
        }

        Ok(ValidatedEntry {
            entry_date: entry.entry_date,
            description: entry.description,
            reference: entry.reference,
            lines: entry.lines,
            balanced_total: total_debits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_line_entry(debit_cents: i64, credit_cents: i64) -> UnvalidatedEntry {
        UnvalidatedEntry {
            entry_date: date(2026, 1, 15),
            description: "Payment".to_string(),
            reference: None,
            lines: vec![
                JournalLine::debit("2410", Money::from_cents(debit_cents), None),
                JournalLine::credit("2040", Money::from_cents(credit_cents), None),
            ],
        }
    }

    #[test]
    fn validate_balanced_entry() {
        let entry = ValidatedEntry::validate(two_line_entry(100_000, 100_000)).unwrap();
        assert_eq!(entry.balanced_total.to_cents(), 100_000);
    }

    #[test]
    fn validate_rejects_unbalanced() {
        assert!(matches!(
            ValidatedEntry::validate(two_line_entry(100_000, 90_000)),
            Err(LedgerError::Unbalanced(_, _))
        ));
    }

    #[test]
    fn validate_rejects_fewer_than_two_lines() {
        let entry = UnvalidatedEntry {
            entry_date: date(2026, 1, 15),
            description: "Single".to_string(),
            reference: None,
            lines: vec![JournalLine::debit("2410", Money::from_cents(100), None)],
        };
        assert!(matches!(
            ValidatedEntry::validate(entry),
            Err(LedgerError::EmptyEntry)
        ));
    }

    #[test]
    fn validate_multi_line_split() {
        let entry = UnvalidatedEntry {
            entry_date: date(2026, 1, 15),
            description: "Split".to_string(),
            reference: Some("IZV-17".to_string()),
            lines: vec![
                JournalLine::debit("2410", Money::from_cents(300), None),
                JournalLine::debit("2411", Money::from_cents(200), None),
                JournalLine::credit("2040", Money::from_cents(500), None),
            ],
        };
        let validated = ValidatedEntry::validate(entry).unwrap();
        assert_eq!(validated.balanced_total.to_cents(), 500);
        assert_eq!(validated.reference.as_deref(), Some("IZV-17"));
    }

    #[test]
    fn line_constructors() {
        let d = JournalLine::debit("2410", Money::from_cents(100), Some("bank".to_string()));
        assert_eq!(d.debit.to_cents(), 100);
        assert!(d.credit.is_zero());

        let c = JournalLine::credit("2040", Money::from_cents(100), None);
        assert!(c.debit.is_zero());
        assert_eq!(c.credit.to_cents(), 100);
    }
}
