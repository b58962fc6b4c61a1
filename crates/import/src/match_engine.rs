use chrono::NaiveDate;
use saldo_core::{DocumentKind, MatchStatus, Money, StatementLine};

/// Weights of the confidence score. Amount proximity is a hard gate: a
/// candidate outside the 1% band scores zero no matter how well the other
/// signals agree.
pub const AMOUNT_EXACT_WEIGHT: i64 = 40;
pub const AMOUNT_NEAR_WEIGHT: i64 = 20;
pub const REFERENCE_WEIGHT: i64 = 40;
pub const REFERENCE_DIGITS_WEIGHT: i64 = 25;
pub const NAME_WEIGHT: i64 = 15;
pub const DUE_DATE_WEIGHT: i64 = 5;

/// Minimum confidence for a tentative match; the amount gate alone.
pub const ACCEPT_THRESHOLD: i64 = 40;
/// At or above this a line is `matched` outright instead of `suggested`.
pub const AUTO_MATCH_THRESHOLD: i64 = 70;

pub const DUE_DATE_WINDOW_DAYS: i64 = 7;

/// An open receivable or payable eligible as a match candidate.
#[derive(Debug, Clone)]
pub struct OpenDocument {
    pub id: i64,
    pub kind: DocumentKind,
    pub number: String,
    pub partner_name: String,
    pub total: Money,
    pub due_date: Option<NaiveDate>,
}

/// The winning pairing for a line. Transient; never persisted as such.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub document_id: i64,
    pub kind: DocumentKind,
    pub confidence: i64,
}

impl MatchCandidate {
    pub fn status(&self) -> MatchStatus {
        if self.confidence >= AUTO_MATCH_THRESHOLD {
            MatchStatus::Matched
        } else {
            MatchStatus::Suggested
        }
    }
}

/// Confidence score for one (line, document) pair, 0..=100.
pub fn score(line: &StatementLine, doc: &OpenDocument) -> i64 {
    let Some(mut confidence) = amount_weight(line.amount, doc.total) else {
        return 0;
    };

    confidence += reference_weight(line.reference.as_deref(), &doc.number);
    confidence += name_weight(line.counterparty_name.as_deref(), &doc.partner_name);
    confidence += due_date_weight(line.line_date, doc.due_date);
    confidence
}

/// Pick the best candidate for a line, or `None` when nothing clears the
/// acceptance threshold. Ties resolve to the lowest document id so repeated
/// runs are deterministic.
pub fn best_candidate(line: &StatementLine, documents: &[OpenDocument]) -> Option<MatchCandidate> {
    let mut best: Option<MatchCandidate> = None;

    for doc in documents {
        // Wrong-polarity documents never match, even if a caller hands us a
        // mixed pool.
        if doc.kind.direction() != line.direction {
            continue;
        }
        let confidence = score(line, doc);
        if confidence < ACCEPT_THRESHOLD {
            continue;
        }
        let better = match &best {
            None => true,
            Some(b) => {
                confidence > b.confidence || (confidence == b.confidence && doc.id < b.document_id)
            }
        };
        if better {
            best = Some(MatchCandidate {
                document_id: doc.id,
                kind: doc.kind,
                confidence,
            });
        }
    }

    best
}

fn amount_weight(line_amount: Money, doc_total: Money) -> Option<i64> {
    let diff = line_amount.diff_cents(doc_total);
    if diff == 0 {
        return Some(AMOUNT_EXACT_WEIGHT);
    }
    // The 1% band is measured against the document total; a drift of a full
    // percent of the invoice fails the gate.
    let basis = doc_total.to_cents().abs();
    if diff.checked_mul(100).is_some_and(|scaled| scaled < basis) {
        Some(AMOUNT_NEAR_WEIGHT)
    } else {
        None
    }
}

fn reference_weight(line_reference: Option<&str>, invoice_number: &str) -> i64 {
    let reference = line_reference.map(str::trim).unwrap_or_default();
    let number = invoice_number.trim();
    if reference.is_empty() || number.is_empty() {
        return 0;
    }

    let reference_lower = reference.to_lowercase();
    let number_lower = number.to_lowercase();
    if reference_lower.contains(&number_lower) || number_lower.contains(&reference_lower) {
        return REFERENCE_WEIGHT;
    }

    // Weaker digits-only comparison: "97 12-345" still finds "12345".
    let reference_digits = digits(reference);
    let number_digits = digits(number);
    if reference_digits.len() > 3
        && number_digits.len() > 3
        && (reference_digits.contains(&number_digits) || number_digits.contains(&reference_digits))
    {
        return REFERENCE_DIGITS_WEIGHT;
    }

    0
}

fn name_weight(line_name: Option<&str>, partner_name: &str) -> i64 {
    let line_name = line_name.map(str::trim).unwrap_or_default();
    let partner = partner_name.trim();
    if line_name.is_empty() || partner.is_empty() {
        return 0;
    }
    let a = line_name.to_lowercase();
    let b = partner.to_lowercase();
    if a.contains(&b) || b.contains(&a) {
        NAME_WEIGHT
    } else {
        0
    }
}

fn due_date_weight(line_date: NaiveDate, due_date: Option<NaiveDate>) -> i64 {
    match due_date {
        Some(due) if (line_date - due).num_days().abs() <= DUE_DATE_WINDOW_DAYS => DUE_DATE_WEIGHT,
        _ => 0,
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}
