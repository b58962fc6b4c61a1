pub mod batch;
pub mod csv;
pub mod format;
pub mod hash;
pub mod match_engine;
pub(crate) mod util;
pub mod xml;

pub use batch::StatementBatch;
pub use csv::CsvError;
pub use format::classify;
pub use hash::content_hash;
pub use match_engine::{best_candidate, MatchCandidate, OpenDocument};
pub use xml::XmlError;

use saldo_core::FileFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error(transparent)]
    Xml(#[from] XmlError),
    #[error("format '{0}' is not auto-parseable")]
    Unsupported(FileFormat),
}

/// Dispatch to the format-specific parser. PDF (and anything else) is not
/// auto-parseable and comes back as `Unsupported`.
pub fn parse_statement(format: FileFormat, data: &[u8]) -> Result<StatementBatch, ParseError> {
    match format {
        FileFormat::Csv => Ok(csv::parse_csv(data)?),
        FileFormat::Xml => Ok(xml::parse(data)?),
        FileFormat::Pdf => Err(ParseError::Unsupported(format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_format() {
        let csv_data = b"date,amount\n2026-01-15,100\n";
        assert!(parse_statement(FileFormat::Csv, csv_data).is_ok());

        let xml_data = b"<Statement>\n<Item>\n<Date>2026-01-15</Date>\n<Amount>100</Amount>\n<CreditDebit>C</CreditDebit>\n</Item>\n</Statement>";
        assert!(parse_statement(FileFormat::Xml, xml_data).is_ok());

        assert!(matches!(
            parse_statement(FileFormat::Pdf, b"%PDF-1.7"),
            Err(ParseError::Unsupported(FileFormat::Pdf))
        ));
    }
}
