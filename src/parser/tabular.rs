//! Delimited text parser
//!
//! Turns raw comma-separated text into records. Quoted fields are not
//! supported: every comma is a delimiter, so a field containing a comma
//! shifts the remaining columns of that row.

use std::collections::HashMap;

use serde::Serialize;

use super::ParseError;
use crate::models::{CellValue, Field, Record};

/// Result of parsing a whole file
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedTable {
    /// Trimmed header names, in column order
    pub headers: Vec<String>,
    /// One record per non-blank data line
    pub records: Vec<Record>,
}

impl ParsedTable {
    /// Whether the header row carries a column for the given field
    pub fn has_field(&self, field: Field) -> bool {
        field.resolve(&self.headers).is_some()
    }
}

/// Split text into lines on `\n`, stripping a trailing `\r`
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Parse a header line into trimmed column names
pub(crate) fn parse_header(line: &str) -> Result<Vec<String>, ParseError> {
    let headers: Vec<String> = line.split(',').map(|h| h.trim().to_string()).collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::EmptyHeader);
    }

    Ok(headers)
}

/// Zip one data line against the headers.
///
/// Missing trailing cells become empty text; surplus cells are ignored.
pub(crate) fn parse_row(headers: &[String], line: &str) -> Record {
    let mut values = line.split(',');
    let mut cells = HashMap::with_capacity(headers.len());

    for header in headers {
        let cell = values
            .next()
            .map(CellValue::coerce)
            .unwrap_or_else(|| CellValue::Text(String::new()));
        cells.insert(header.clone(), cell);
    }

    Record::from_cells(cells)
}

/// Parse the full text in one pass
pub fn parse_table(text: &str) -> Result<ParsedTable, ParseError> {
    let mut lines = split_lines(text).skip_while(|line| line.trim().is_empty());

    let header_line = lines.next().ok_or(ParseError::EmptyHeader)?;
    let headers = parse_header(header_line)?;

    let records = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_row(&headers, line))
        .collect();

    Ok(ParsedTable { headers, records })
}

/// Parse text into records
pub fn parse(text: &str) -> Result<Vec<Record>, ParseError> {
    parse_table(text).map(|table| table.records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "日期,付费区间,消耗途径,物品名称,天玉消耗额,角色数\n\
        2025-04-17,土豪,Unlock Appearance,Skin A,1000,1\n\
        17/4/2025,平民,Mall Purchase,Potion,200,2\n";

    #[test]
    fn test_parse_basic() {
        let table = parse_table(SAMPLE).unwrap();
        assert_eq!(table.headers.len(), 6);
        assert_eq!(table.records.len(), 2);

        let first = &table.records[0];
        assert_eq!(first.number(Field::Amount), 1000.0);
        assert_eq!(first.label(Field::PaymentTier).as_deref(), Some("土豪"));
        assert_eq!(first.label(Field::Date).as_deref(), Some("2025-04-17"));
    }

    #[test]
    fn test_parse_crlf_and_blank_lines() {
        let text = "\r\n\r\nDate,Amount\r\n2025-04-17,5\r\n\r\n   \r\n2025-04-18,7\r\n";
        let records = parse(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].number(Field::Amount), 7.0);
    }

    #[test]
    fn test_header_is_trimmed() {
        let table = parse_table(" Date , Amount \n2025-04-17,5").unwrap();
        assert_eq!(table.headers, vec!["Date".to_string(), "Amount".to_string()]);
        assert!(table.has_field(Field::Date));
        assert!(!table.has_field(Field::Channel));
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(matches!(parse(""), Err(ParseError::EmptyHeader)));
        assert!(matches!(parse("\n\n  \n"), Err(ParseError::EmptyHeader)));
        assert!(matches!(parse(" , ,\n1,2,3"), Err(ParseError::EmptyHeader)));
    }

    #[test]
    fn test_short_and_long_rows() {
        let records = parse("A,B,C\n1\n1,2,3,4").unwrap();
        assert_eq!(records[0].get("B"), Some(&CellValue::Text(String::new())));
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].get("C"), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_quoted_commas_are_not_special() {
        let records = parse("Item,Amount\n\"Skin, Red\",5").unwrap();
        assert_eq!(
            records[0].get("Item"),
            Some(&CellValue::Text("\"Skin".to_string()))
        );
        assert_eq!(
            records[0].get("Amount"),
            Some(&CellValue::Text("Red\"".to_string()))
        );
    }

    #[test]
    fn test_header_only() {
        let table = parse_table("Date,Amount\n").unwrap();
        assert!(table.records.is_empty());
    }
}
