use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse an amount accepting decimal-comma or decimal-point input, with
/// optional thousands separators ("1.234,56", "1,234.56", "1234,56").
/// A lone comma is treated as the decimal separator.
pub(crate) fn parse_flexible_amount(s: &str) -> Option<Decimal> {
    let s: String = s.trim().chars().filter(|c| !c.is_whitespace()).collect();
    if s.is_empty() {
        return None;
    }

    let normalized = match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        _ => s,
    };

    Decimal::from_str(&normalized).ok()
}

/// Parse a business date in ISO or regional day-first notation.
pub(crate) fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in &["%Y-%m-%d", "%d.%m.%Y.", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_decimal_point() {
        assert_eq!(parse_flexible_amount("123.45"), Decimal::from_str("123.45").ok());
    }

    #[test]
    fn amount_decimal_comma() {
        assert_eq!(parse_flexible_amount("123,45"), Decimal::from_str("123.45").ok());
    }

    #[test]
    fn amount_thousands_dot_decimal_comma() {
        assert_eq!(
            parse_flexible_amount("1.234,56"),
            Decimal::from_str("1234.56").ok()
        );
    }

    #[test]
    fn amount_thousands_comma_decimal_dot() {
        assert_eq!(
            parse_flexible_amount("1,234.56"),
            Decimal::from_str("1234.56").ok()
        );
    }

    #[test]
    fn amount_negative_with_spaces() {
        assert_eq!(
            parse_flexible_amount(" -2 500,00 "),
            Decimal::from_str("-2500.00").ok()
        );
    }

    #[test]
    fn amount_invalid() {
        assert_eq!(parse_flexible_amount(""), None);
        assert_eq!(parse_flexible_amount("n/a"), None);
    }

    #[test]
    fn date_iso_and_regional() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(parse_flexible_date("2026-01-15"), Some(expected));
        assert_eq!(parse_flexible_date("15.01.2026"), Some(expected));
        assert_eq!(parse_flexible_date("15.01.2026."), Some(expected));
        assert_eq!(parse_flexible_date("not-a-date"), None);
    }
}
