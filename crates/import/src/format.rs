use saldo_core::FileFormat;

/// Classify an upload by its file extension. Content is not sniffed; an
/// unknown or missing extension yields `None` and the import stays pending
/// for manual handling.
pub fn classify(filename: &str) -> Option<FileFormat> {
    let ext = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
    match ext.as_str() {
        "xml" => Some(FileFormat::Xml),
        "csv" => Some(FileFormat::Csv),
        "pdf" => Some(FileFormat::Pdf),
        _ => None,
    }
}
