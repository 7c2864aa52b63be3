//! Upload-stage checks
//!
//! Validates the uploaded file and reads it into memory before parsing.

use std::path::Path;

use super::ParseError;

/// Only comma-separated exports are accepted
pub const ACCEPTED_EXTENSION: &str = "csv";

/// Reject anything that does not carry a `.csv` extension
pub fn check_extension(path: &Path) -> Result<(), ParseError> {
    let accepted = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION))
        .unwrap_or(false);

    if accepted {
        Ok(())
    } else {
        Err(ParseError::UnsupportedExtension(path.display().to_string()))
    }
}

/// Read an uploaded export as UTF-8 text
pub async fn read_input(path: &Path) -> Result<String, ParseError> {
    check_extension(path)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ParseError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;

    // Excel exports often start with a BOM
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);

    String::from_utf8(bytes.to_vec())
        .map_err(|_| ParseError::InvalidEncoding(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_check_extension() {
        assert!(check_extension(Path::new("/tmp/report.csv")).is_ok());
        assert!(check_extension(Path::new("/tmp/REPORT.CSV")).is_ok());
        assert!(matches!(
            check_extension(Path::new("/tmp/report.xlsx")),
            Err(ParseError::UnsupportedExtension(_))
        ));
        assert!(check_extension(Path::new("/tmp/report")).is_err());
    }

    #[tokio::test]
    async fn test_read_input_strips_bom() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"\xEF\xBB\xBFDate,Amount\n2025-04-17,5\n").unwrap();

        let text = read_input(file.path()).await.unwrap();
        assert!(text.starts_with("Date"));
    }

    #[tokio::test]
    async fn test_read_input_missing_file() {
        let result = read_input(Path::new("/nonexistent/dir/export.csv")).await;
        assert!(matches!(result, Err(ParseError::Unreadable { .. })));
    }

    #[tokio::test]
    async fn test_read_input_invalid_utf8() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x41]).unwrap();

        let result = read_input(file.path()).await;
        assert!(matches!(result, Err(ParseError::InvalidEncoding(_))));
    }
}
