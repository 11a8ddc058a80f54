//! Reassembly of accepted rows into delimited text.
//!
//! The corrected file keeps the input's delimiter and the subject's canonical
//! header order. A field is quoted only when it contains the delimiter, which
//! is what the ERP importer expects; the auxiliary tables in [`auxiliary`]
//! are regular `;` CSV.

pub mod auxiliary;

use crate::models::Row;

/// Quote a field when it contains the delimiter, doubling inner quotes.
pub fn quote_field(value: &str, delimiter: char) -> String {
    if value.contains(delimiter) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Header line plus one line per row, joined with `\n`, no trailing newline.
///
/// Columns the input did not have are written blank.
pub fn to_delimited(headers: &[&str], rows: &[Row], delimiter: char) -> String {
    let sep = delimiter.to_string();
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(&sep));
    for row in rows {
        let fields: Vec<String> = headers
            .iter()
            .map(|h| quote_field(row.get(h), delimiter))
            .collect();
        lines.push(fields.join(&sep));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_only_on_delimiter() {
        assert_eq!(quote_field("a;b", ';'), "\"a;b\"");
        assert_eq!(quote_field("say \"hi\"; bye", ';'), "\"say \"\"hi\"\"; bye\"");
        assert_eq!(quote_field("a,b", ';'), "a,b");
        assert_eq!(quote_field("say \"hi\"", ';'), "say \"hi\"");
    }

    #[test]
    fn test_header_order_and_missing_columns() {
        let rows = vec![
            Row::from_pairs(0, [("B", "2"), ("A", "1")]),
            Row::from_pairs(1, [("A", "x,y")]),
        ];
        let text = to_delimited(&["A", "B", "C"], &rows, ',');
        assert_eq!(text, "A,B,C\n1,2,\n\"x,y\",,");
    }

    #[test]
    fn test_reparse_recovers_values() {
        let rows = vec![Row::from_pairs(0, [("A", "um; dois"), ("B", "\"três\"; quatro")])];
        let text = to_delimited(&["A", "B"], &rows, ';');

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(text.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "um; dois");
        assert_eq!(&record[1], "\"três\"; quatro");
    }

    #[test]
    fn test_no_rows_is_header_only() {
        assert_eq!(to_delimited(&["A", "B"], &[], ';'), "A;B");
    }
}
