use chrono::NaiveDate;
use saldo_core::{Direction, Money, NewStatementLine};
use serde::{Deserialize, Serialize};

/// The normalized output of a statement parse: canonical lines plus the
/// aggregate credit/debit totals used to derive the closing balance.
/// Either the whole batch is produced or the parse fails; a batch is never
/// partially written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementBatch {
    pub statement_number: Option<String>,
    pub statement_date: Option<NaiveDate>,
    pub account_number: Option<String>,
    pub currency: Option<String>,
    pub lines: Vec<NewStatementLine>,
    pub total_credit: Money,
    pub total_debit: Money,
}

impl StatementBatch {
    pub fn new() -> Self {
        StatementBatch {
            statement_number: None,
            statement_date: None,
            account_number: None,
            currency: None,
            lines: Vec::new(),
            total_credit: Money::zero(),
            total_debit: Money::zero(),
        }
    }

    pub fn push(&mut self, line: NewStatementLine) {
        match line.direction {
            Direction::Credit => self.total_credit = self.total_credit + line.amount,
            Direction::Debit => self.total_debit = self.total_debit + line.amount,
        }
        self.lines.push(line);
    }

    /// `sum(credits) − sum(debits)` over the parsed lines.
    pub fn closing_balance(&self) -> Money {
        self.total_credit - self.total_debit
    }

    pub fn last_line_date(&self) -> Option<NaiveDate> {
        self.lines.iter().map(|l| l.line_date).max()
    }
}

impl Default for StatementBatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(cents: i64, direction: Direction, day: u32) -> NewStatementLine {
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

    #[test]
    fn totals_and_closing_balance() {
        let mut batch = StatementBatch::new();
        batch.push(line(10_000, Direction::Credit, 3));
        batch.push(line(2_500, Direction::Debit, 5));
        batch.push(line(5_000, Direction::Credit, 4));

        assert_eq!(batch.total_credit.to_cents(), 15_000);
        assert_eq!(batch.total_debit.to_cents(), 2_500);
        assert_eq!(batch.closing_balance().to_cents(), 12_500);
        assert_eq!(
            batch.last_line_date(),
            Some(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
        );
    }

    #[test]
    fn empty_batch() {
        let batch = StatementBatch::new();
        assert!(batch.closing_balance().is_zero());
        assert_eq!(batch.last_line_date(), None);
    }
}
