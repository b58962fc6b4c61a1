use chrono::NaiveDate;
use saldo_core::{Direction, Money, NewStatementLine};
use thiserror::Error;

use crate::batch::StatementBatch;
use crate::util::{parse_flexible_amount, parse_flexible_date};

/// Parser for the vendor bank-statement XML dialect. The format is strictly
/// line-oriented: one `<Tag>value</Tag>` pair per line, with `<Item>` /
/// `</Item>` wrapping each transaction:
///
/// ```text
/// <Statement>
///   <AccountNumber>160-0000123456789-12</AccountNumber>
///   <StatementNumber>17</StatementNumber>
///   <StatementDate>2026-01-31</StatementDate>
///   <Currency>RSD</Currency>
///   <Item>
///     <Date>2026-01-15</Date>
///     <Amount>50000,00</Amount>
///     <CreditDebit>C</CreditDebit>
///     <Description>Uplata po racunu</Description>
///     <PartnerName>Firma DOO</PartnerName>
///     <PartnerAccount>205-0000000111111-33</PartnerAccount>
///     <Reference>97 12-345</Reference>
///     <Purpose>Placanje po fakturi</Purpose>
///   </Item>
/// </Statement>
/// ```
///
/// Unlike the CSV path, structural problems here are hard errors: the file
/// is bank-produced, so a malformed item means the whole import is suspect.
pub struct XmlParser;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("malformed XML near line {0}")]
    Malformed(usize),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid credit/debit indicator: {0}")]
    InvalidDirection(String),
    #[error("statement contains no items")]
    NoItems,
}

#[derive(Default)]
struct BuildingItem {
    date: Option<NaiveDate>,
    amount: Option<Money>,
    zero_amount: bool,
    direction: Option<Direction>,
    description: Option<String>,
    partner_name: Option<String>,
    partner_account: Option<String>,
    reference: Option<String>,
    purpose: Option<String>,
}

impl BuildingItem {
    fn finish(self) -> Result<Option<NewStatementLine>, XmlError> {
        // Zero-amount items carry no reconcilable value; drop them the same
        // way the CSV path does.
        if self.zero_amount {
            return Ok(None);
        }
        let date = self.date.ok_or(XmlError::MissingField("Date"))?;
        let amount = self.amount.ok_or(XmlError::MissingField("Amount"))?;
        let direction = self.direction.ok_or(XmlError::MissingField("CreditDebit"))?;

        Ok(Some(NewStatementLine {
            line_date: date,
            description: self.description.unwrap_or_default(),
            amount,
            direction,
            counterparty_name: self.partner_name,
            counterparty_account: self.partner_account,
            reference: self.reference,
            purpose: self.purpose,
        }))
    }
}

/// Minimal entity decoding for text content.
fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Split a line into `(tag_name, inline_value)`. Closing tags come back as
/// `("/Name", None)`.
fn split_tag(line: &str) -> Option<(&str, Option<&str>)> {
    let rest = line.strip_prefix('<')?;
    let (name, after) = rest.split_once('>')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = after.split("</").next().map(str::trim).filter(|v| !v.is_empty());
    Some((name, value))
}

fn parse_direction(value: &str) -> Result<Direction, XmlError> {
    match value.trim().to_uppercase().as_str() {
        s if s.starts_with('C') => Ok(Direction::Credit),
        s if s.starts_with('D') => Ok(Direction::Debit),
        other => Err(XmlError::InvalidDirection(other.to_string())),
    }
}

impl XmlParser {
    pub fn parse(data: &str) -> Result<StatementBatch, XmlError> {
        let mut batch = StatementBatch::new();
        let mut current: Option<BuildingItem> = None;

        for (line_no, line) in data.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("<?") {
                continue;
            }

            let Some((tag, value)) = split_tag(line) else {
                return Err(XmlError::Malformed(line_no + 1));
            };

            match tag {
                "Item" => {
                    if current.is_some() {
                        return Err(XmlError::Malformed(line_no + 1));
                    }
                    current = Some(BuildingItem::default());
                }
                "/Item" => {
                    let item = current.take().ok_or(XmlError::Malformed(line_no + 1))?;
                    if let Some(line) = item.finish()? {
                        batch.push(line);
                    }
                }
                _ => {
                    let value = value.map(unescape);
                    if let Some(ref mut item) = current {
                        Self::item_field(item, tag, value)?;
                    } else {
                        Self::statement_field(&mut batch, tag, value)?;
                    }
                }
            }
        }

        if current.is_some() {
            return Err(XmlError::MissingField("/Item"));
        }
        if batch.lines.is_empty() {
            return Err(XmlError::NoItems);
        }

        Ok(batch)
    }

    fn statement_field(
        batch: &mut StatementBatch,
        tag: &str,
        value: Option<String>,
    ) -> Result<(), XmlError> {
        match tag {
            "AccountNumber" => batch.account_number = value,
            "StatementNumber" => batch.statement_number = value,
            "Currency" => batch.currency = value,
            "StatementDate" => {
                if let Some(v) = value {
                    batch.statement_date =
                        Some(parse_flexible_date(&v).ok_or(XmlError::InvalidDate(v))?);
                }
            }
            // Container tags and anything vendor-specific we don't consume.
            _ => {}
        }
        Ok(())
    }

    fn item_field(
        item: &mut BuildingItem,
        tag: &str,
        value: Option<String>,
    ) -> Result<(), XmlError> {
        let Some(v) = value else { return Ok(()) };
        match tag {
            "Date" => {
                item.date = Some(parse_flexible_date(&v).ok_or(XmlError::InvalidDate(v))?);
            }
            "Amount" => {
                let decimal =
                    parse_flexible_amount(&v).ok_or_else(|| XmlError::InvalidAmount(v.clone()))?;
                if decimal.is_zero() {
                    item.zero_amount = true;
                } else {
                    item.amount = Some(
                        Money::from_decimal(decimal.abs()).ok_or(XmlError::InvalidAmount(v))?,
                    );
                }
            }
            "CreditDebit" => item.direction = Some(parse_direction(&v)?),
            "Description" => item.description = Some(v),
            "PartnerName" => item.partner_name = Some(v),
            "PartnerAccount" => item.partner_account = Some(v),
            "Reference" => item.reference = Some(v),
            "Purpose" => item.purpose = Some(v),
            _ => {}
        }
        Ok(())
    }
}

pub fn parse(data: &[u8]) -> Result<StatementBatch, XmlError> {
    let content = String::from_utf8_lossy(data);
    XmlParser::parse(&content)
}
