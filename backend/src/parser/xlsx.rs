//! Excel input (`.xlsx` / `.xls`).
//!
//! Reads the first worksheet into the same [`ParsedSheet`] shape as delimited
//! text so the pipeline does not care where rows came from.

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use std::path::Path;

use super::{repair_mojibake, ParsedSheet};
use crate::error::{CsvError, CsvResult};
use crate::models::Row;

/// Delimiter used when an Excel sheet is written back as text.
pub const WORKBOOK_DELIMITER: char = ';';

/// Whether the path has a spreadsheet extension.
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| is_spreadsheet_name(&format!("x.{}", e)))
        .unwrap_or(false)
}

/// Whether a file name (e.g. from an upload) looks like a spreadsheet.
pub fn is_spreadsheet_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".xlsx") || lower.ends_with(".xls")
}

/// Read the first worksheet of a workbook on disk.
pub fn parse_workbook(path: &Path) -> CsvResult<ParsedSheet> {
    let mut workbook = open_workbook_auto(path).map_err(|e| CsvError::Excel(e.to_string()))?;
    let sheet_names = workbook.sheet_names();
    let first = sheet_names
        .first()
        .ok_or_else(|| CsvError::Excel("workbook has no worksheet".to_string()))?;
    let range = workbook
        .worksheet_range(first)
        .map_err(|e| CsvError::Excel(e.to_string()))?;
    sheet_from_range(&range)
}

/// Read the first worksheet of an in-memory workbook.
pub fn parse_workbook_bytes(bytes: &[u8]) -> CsvResult<ParsedSheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| CsvError::Excel(e.to_string()))?;
    let sheet_names = workbook.sheet_names();
    let first = sheet_names
        .first()
        .ok_or_else(|| CsvError::Excel("workbook has no worksheet".to_string()))?;
    let range = workbook
        .worksheet_range(first)
        .map_err(|e| CsvError::Excel(e.to_string()))?;
    sheet_from_range(&range)
}

fn cell_text(cell: &Data) -> String {
    repair_mojibake(cell.to_string().trim())
}

fn sheet_from_range(range: &Range<Data>) -> CsvResult<ParsedSheet> {
    let mut rows = range
        .rows()
        .filter(|r| r.iter().any(|c| !cell_text(c).is_empty()));

    let headers: Vec<String> = rows
        .next()
        .ok_or(CsvError::EmptyFile)?
        .iter()
        .map(cell_text)
        .collect();

    let rows = rows
        .enumerate()
        .map(|(index, cells)| {
            Row::from_pairs(
                index,
                headers.iter().enumerate().map(|(i, header)| {
                    (header.clone(), cells.get(i).map(cell_text).unwrap_or_default())
                }),
            )
        })
        .collect();

    Ok(ParsedSheet {
        headers,
        rows,
        delimiter: WORKBOOK_DELIMITER,
        encoding: "xlsx".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_extensions() {
        assert!(is_spreadsheet(Path::new("/tmp/pessoas.XLSX")));
        assert!(is_spreadsheet(Path::new("legado.xls")));
        assert!(!is_spreadsheet(Path::new("pessoas.csv")));
        assert!(!is_spreadsheet(Path::new("sem_extensao")));
        assert!(is_spreadsheet_name("Plano Contábil.xlsx"));
    }

    #[test]
    fn test_range_to_rows_skips_blank_rows() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 1));
        range.set_value((0, 0), Data::String("CODIGO".into()));
        range.set_value((0, 1), Data::String("NOME".into()));
        range.set_value((1, 0), Data::Float(7.0));
        range.set_value((1, 1), Data::String(" Ana ".into()));
        // row 2 left empty
        range.set_value((3, 0), Data::String("8".into()));

        let sheet = sheet_from_range(&range).unwrap();
        assert_eq!(sheet.headers, vec!["CODIGO", "NOME"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].get("CODIGO"), "7");
        assert_eq!(sheet.rows[0].get("NOME"), "Ana");
        assert_eq!(sheet.rows[1].line, 3);
        assert_eq!(sheet.rows[1].get("NOME"), "");
        assert_eq!(sheet.delimiter, ';');
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let err = parse_workbook_bytes(b"not a workbook").unwrap_err();
        assert!(matches!(err, CsvError::Excel(_)));
    }
}
