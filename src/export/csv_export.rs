//! CSV export functionality
//!
//! Provides CSV serialization for the daily trend table and the item ranking.

use std::path::Path;

use csv::Writer;
use serde::Serialize;

use super::{ExportableProduct, ExportableTrendRow};
use crate::CommandError;

fn write_rows<T: Serialize>(rows: &[T], path: &Path) -> Result<(), CommandError> {
    let file = std::fs::File::create(path)
        .map_err(|e| CommandError::Export(format!("Failed to create CSV file: {}", e)))?;

    let mut writer = Writer::from_writer(file);

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| CommandError::Export(format!("Failed to write CSV record: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| CommandError::Export(format!("Failed to flush CSV: {}", e)))?;

    Ok(())
}

/// Write the daily trend table
pub fn write_trend_csv(rows: &[ExportableTrendRow], path: &Path) -> Result<(), CommandError> {
    write_rows(rows, path)?;
    tracing::info!("Exported {} trend rows to {:?}", rows.len(), path);
    Ok(())
}

/// Write the item ranking
pub fn write_ranking_csv(rows: &[ExportableProduct], path: &Path) -> Result<(), CommandError> {
    write_rows(rows, path)?;
    tracing::info!("Exported {} ranked items to {:?}", rows.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_test_row() -> ExportableTrendRow {
        ExportableTrendRow {
            date: "2025-04-17".to_string(),
            total: 1200.0,
            whale: 1000.0,
            big_spender: 0.0,
            mid_spender: 0.0,
            small_spender: 0.0,
            free_user: 200.0,
            trend_value: 1200.0,
        }
    }

    #[test]
    fn test_write_trend_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trend.csv");

        write_trend_csv(&[create_test_row()], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "date,total,whale,big_spender,mid_spender,small_spender,free_user,trend_value"
        );
        assert_eq!(lines[1], "2025-04-17,1200.0,1000.0,0.0,0.0,0.0,200.0,1200.0");
    }

    #[test]
    fn test_write_ranking_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranking.csv");

        let rows = vec![
            ExportableProduct {
                rank: 1,
                name: "Skin A".to_string(),
                consumption: 1000.0,
                share: 0.5,
            },
            ExportableProduct {
                rank: 2,
                name: "Potion".to_string(),
                consumption: 500.0,
                share: 0.25,
            },
        ];
        write_ranking_csv(&rows, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3); // Header + 2 items
        assert_eq!(lines[0], "rank,name,consumption,share");
        assert!(lines[1].starts_with("1,Skin A,1000.0"));
    }

    #[test]
    fn test_write_empty_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_ranking_csv(&[], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("trend.csv");

        let err = write_trend_csv(&[create_test_row()], &path).unwrap_err();
        assert!(err.to_string().contains("Failed to create CSV file"));
    }
}
