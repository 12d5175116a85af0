//! Excel workbook source.
//!
//! Reads the first worksheet of an `.xlsx`/`.xls` upload. The first row is the
//! header; each following row becomes a [`SourceRow`] keyed by header text.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use super::ImportError;
use super::row::{CellValue, SourceRow};

/// File extensions accepted for upload.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Whether an uploaded file name looks like a workbook.
#[must_use]
pub fn is_workbook_name(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
}

/// Parse workbook bytes into rows.
///
/// # Errors
///
/// Returns `ImportError::Workbook` if the bytes are not a readable workbook,
/// and `ImportError::EmptyWorkbook` if it has no worksheet or no header row.
pub fn read_workbook(bytes: Vec<u8>) -> Result<Vec<SourceRow>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptyWorkbook)??;

    let grid = range
        .rows()
        .map(|cells| cells.iter().map(cell_value).collect())
        .collect();

    rows_from_grid(grid)
}

/// Convert a grid of cells (header row first) into rows.
///
/// Columns with a blank header are ignored, empty cells are omitted, and rows
/// with no values at all are skipped. When a header repeats, the leftmost
/// non-empty cell under it is kept.
///
/// # Errors
///
/// Returns `ImportError::EmptyWorkbook` if the grid has no header row.
pub fn rows_from_grid(grid: Vec<Vec<Option<CellValue>>>) -> Result<Vec<SourceRow>, ImportError> {
    let mut lines = grid.into_iter();
    let header: Vec<Option<String>> = lines
        .next()
        .ok_or(ImportError::EmptyWorkbook)?
        .into_iter()
        .map(|cell| cell.map(|c| c.as_text()).filter(|h| !h.is_empty()))
        .collect();

    if header.iter().all(Option::is_none) {
        return Err(ImportError::EmptyWorkbook);
    }

    let rows = lines
        .map(|cells| {
            header
                .iter()
                .zip(cells)
                .filter_map(|(name, cell)| Some((name.clone()?, cell?)))
                .collect::<SourceRow>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(rows)
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Int(*i)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        other => Some(CellValue::Text(other.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_xlsxwriter::Workbook;

    use super::*;
    use crate::import::row::columns;

    fn text(s: &str) -> Option<CellValue> {
        Some(CellValue::Text(s.to_string()))
    }

    #[test]
    fn test_rows_from_grid_keys_by_header() {
        let grid = vec![
            vec![text("Ürün Adı"), text("Fiyat"), None],
            vec![text("Kupa"), Some(CellValue::Number(45.0)), text("ignored")],
            vec![None, None, None],
            vec![text("Tabak"), None],
        ];

        let rows = rows_from_grid(grid).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].lookup(columns::PRICE),
            Some(&CellValue::Number(45.0))
        );
        assert_eq!(rows[1].lookup(columns::PRICE), None);
    }

    #[test]
    fn test_repeated_header_keeps_first_column() {
        let grid = vec![
            vec![text("name"), text("Fiyat"), text("Fiyat"), text("Name")],
            vec![text("Kupa"), text("45"), text("99"), text("Fincan")],
        ];

        let rows = rows_from_grid(grid).unwrap();

        assert_eq!(rows[0].lookup(columns::PRICE), text("45").as_ref());
        assert_eq!(rows[0].lookup(columns::NAME), text("Kupa").as_ref());
    }

    #[test]
    fn test_rows_from_grid_requires_header() {
        assert!(matches!(
            rows_from_grid(vec![]),
            Err(ImportError::EmptyWorkbook)
        ));
        assert!(matches!(
            rows_from_grid(vec![vec![None, text("  ")]]),
            Err(ImportError::EmptyWorkbook)
        ));
    }

    #[test]
    fn test_read_workbook_from_xlsx_bytes() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Ürün Adı").unwrap();
        sheet.write_string(0, 1, "Fiyat").unwrap();
        sheet.write_string(0, 2, "Aktif").unwrap();
        sheet.write_string(1, 0, "Seramik Vazo").unwrap();
        sheet.write_number(1, 1, 220.5).unwrap();
        sheet.write_boolean(1, 2, false).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let rows = read_workbook(bytes).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].lookup(columns::NAME),
            Some(&CellValue::Text("Seramik Vazo".to_string()))
        );
        assert_eq!(
            rows[0].lookup(columns::ACTIVE),
            Some(&CellValue::Bool(false))
        );
    }

    #[test]
    fn test_read_workbook_rejects_garbage() {
        assert!(matches!(
            read_workbook(b"definitely not a workbook".to_vec()),
            Err(ImportError::Workbook(_))
        ));
    }

    #[test]
    fn test_is_workbook_name() {
        assert!(is_workbook_name("urunler.xlsx"));
        assert!(is_workbook_name("ESKI.XLS"));
        assert!(!is_workbook_name("urunler.csv"));
        assert!(!is_workbook_name("xlsx"));
    }
}
