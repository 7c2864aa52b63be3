//! Batched parsing for large inputs
//!
//! Lines are processed in fixed-size batches. Between batches the task yields
//! back to the runtime and reports how far it got, so a single-threaded host
//! stays responsive while a big export is parsed.

use super::tabular::{parse_header, parse_row, split_lines, ParsedTable};
use super::ParseError;

/// Default number of lines per batch
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Parse `text` in batches of `batch_size` lines.
///
/// `on_progress` receives the parsed fraction as a percentage in `[0, 100]`
/// after every batch and always ends with 100 on success.
pub async fn parse_chunked<F>(
    text: &str,
    batch_size: usize,
    mut on_progress: F,
) -> Result<ParsedTable, ParseError>
where
    F: FnMut(u8),
{
    let batch_size = batch_size.max(1);
    let mut lines = split_lines(text).skip_while(|line| line.trim().is_empty());

    let header_line = lines.next().ok_or(ParseError::EmptyHeader)?;
    let headers = parse_header(header_line)?;

    let body: Vec<&str> = lines.collect();
    let total = body.len();
    let mut records = Vec::with_capacity(total);
    let mut processed = 0usize;

    on_progress(0);

    for batch in body.chunks(batch_size) {
        records.extend(
            batch
                .iter()
                .filter(|line| !line.trim().is_empty())
                .map(|line| parse_row(&headers, line)),
        );

        processed += batch.len();
        on_progress(percent(processed, total));

        tokio::task::yield_now().await;
    }

    if total == 0 {
        on_progress(100);
    }

    tracing::debug!(
        "Parsed {} records from {} lines in batches of {}",
        records.len(),
        total,
        batch_size
    );

    Ok(ParsedTable { headers, records })
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;

    fn build_input(rows: usize) -> String {
        let mut text = String::from("Date,Amount\n");
        for i in 0..rows {
            text.push_str(&format!("2025-04-{:02},{}\n", (i % 28) + 1, i));
        }
        text
    }

    #[tokio::test]
    async fn test_chunked_matches_single_pass() {
        let text = build_input(2_500);
        let chunked = parse_chunked(&text, 1_000, |_| {}).await.unwrap();
        let single = super::super::tabular::parse_table(&text).unwrap();

        assert_eq!(chunked.records.len(), 2_500);
        assert_eq!(chunked.records, single.records);
        assert_eq!(chunked.records[42].number(Field::Amount), 42.0);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_100() {
        let text = build_input(2_500);
        let mut seen = Vec::new();
        parse_chunked(&text, 1_000, |p| seen.push(p)).await.unwrap();

        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.iter().all(|p| *p <= 100));
    }

    #[tokio::test]
    async fn test_header_only_reports_completion() {
        let mut seen = Vec::new();
        let table = parse_chunked("Date,Amount", 10, |p| seen.push(p)).await.unwrap();
        assert!(table.records.is_empty());
        assert_eq!(seen.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_empty_header_fails() {
        let result = parse_chunked("\n\n", 10, |_| {}).await;
        assert!(matches!(result, Err(ParseError::EmptyHeader)));
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 10), 0);
        assert_eq!(percent(5, 10), 50);
        assert_eq!(percent(10, 10), 100);
        assert_eq!(percent(3, 0), 100);
    }
}
