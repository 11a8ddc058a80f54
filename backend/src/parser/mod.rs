//! Delimited-text parser with encoding and delimiter auto-detection.
//!
//! Turns raw spreadsheet exports into header-keyed [`Row`]s. No subject
//! specific logic lives here apart from the header coverage check.

pub mod xlsx;

use std::path::Path;

use crate::error::{CsvError, CsvResult, ValidationError};
use crate::models::Row;

/// Double-encoded accented sequences seen in legacy exports, repaired in order.
const MOJIBAKE_REPAIRS: &[(&str, &str)] = &[
    ("NÃƒO", "NAO"),
    ("NÃ£o", "NAO"),
    ("SÃ­m", "SIM"),
    ("Ã§", "ç"),
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã­", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã\u{a0}", "à"),
    ("Ã¢", "â"),
    ("Ãª", "ê"),
    ("Ã´", "ô"),
    ("Ã¼", "ü"),
];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    /// Header names as found in the file
    pub headers: Vec<String>,
    /// Data rows, blank lines removed
    pub rows: Vec<Row>,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Detected or used encoding
    pub encoding: String,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .map_err(|e| CsvError::Encoding(e.to_string())),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.into_owned())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()),
        _ => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Decode bytes, preferring UTF-8 and falling back to the detected legacy encoding.
///
/// Returns the text and the encoding used.
pub fn decode_auto(bytes: &[u8]) -> CsvResult<(String, String)> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok((text.to_string(), "utf-8".to_string()));
    }

    // Only Latin-1 family fallbacks make sense for these exports
    let encoding = match detect_encoding(bytes).as_str() {
        "iso-8859-1" => "iso-8859-1".to_string(),
        _ => "windows-1252".to_string(),
    };
    let text = decode_content(bytes, &encoding)?;
    Ok((text, encoding))
}

/// Remove a leading byte-order mark.
pub fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// Repair common double-encoded Portuguese characters.
pub fn repair_mojibake(content: &str) -> String {
    MOJIBAKE_REPAIRS
        .iter()
        .fold(content.to_string(), |acc, &(broken, fixed)| {
            if acc.contains(broken) {
                acc.replace(broken, fixed)
            } else {
                acc
            }
        })
}

/// Pick `;` or `,` by counting occurrences in the first non-blank line.
///
/// Semicolon wins only when strictly more frequent.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("");

    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();

    if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Split one line into trimmed fields.
///
/// Quotes toggle literal mode, `""` inside quotes is an escaped quote, and one
/// leftover surrounding quote is stripped from each field.
pub fn parse_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
            continue;
        }

        if c == delimiter && !in_quotes {
            fields.push(finish_field(&current));
            current.clear();
            continue;
        }

        current.push(c);
    }

    fields.push(finish_field(&current));
    fields
}

fn finish_field(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.to_string()
}

/// Parse already-decoded text.
///
/// The header row is the first non-blank line. Blank lines are skipped and do
/// not consume a line number. Missing trailing fields read as blank; extra
/// fields are ignored.
///
/// # Example
/// ```ignore
/// let sheet = parse_text("CODIGO;NOME\n1;Ana", None)?;
/// assert_eq!(sheet.delimiter, ';');
/// assert_eq!(sheet.rows[0].get("NOME"), "Ana");
/// ```
pub fn parse_text(content: &str, delimiter: Option<char>) -> CsvResult<ParsedSheet> {
    let cleaned = repair_mojibake(strip_bom(content));
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&cleaned));

    let mut lines = cleaned.lines().filter(|l| !l.trim().is_empty());

    let header_line = lines.next().ok_or(CsvError::EmptyFile)?;
    let headers = parse_line(header_line, delimiter);
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let rows = lines
        .enumerate()
        .map(|(index, line)| {
            let values = parse_line(line, delimiter);
            Row::from_pairs(
                index,
                headers.iter().enumerate().map(|(i, header)| {
                    (header.clone(), values.get(i).cloned().unwrap_or_default())
                }),
            )
        })
        .collect();

    Ok(ParsedSheet {
        headers,
        rows,
        delimiter,
        encoding: "utf-8".to_string(),
    })
}

/// Parse raw bytes with encoding auto-detection.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> CsvResult<ParsedSheet> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }
    let (content, encoding) = decode_auto(bytes)?;
    let mut sheet = parse_text(&content, delimiter)?;
    sheet.encoding = encoding;
    Ok(sheet)
}

/// Parse a file, choosing the reader from its extension.
///
/// `.xlsx`/`.xls` go through [`xlsx::parse_workbook`], everything else is
/// treated as delimited text.
pub fn parse_file<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> CsvResult<ParsedSheet> {
    let path = path.as_ref();
    if xlsx::is_spreadsheet(path) {
        return xlsx::parse_workbook(path);
    }
    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes, delimiter)
}

/// Parse an upload, choosing the reader from its file name.
pub fn parse_upload(
    bytes: &[u8],
    file_name: Option<&str>,
    delimiter: Option<char>,
) -> CsvResult<ParsedSheet> {
    match file_name {
        Some(name) if xlsx::is_spreadsheet_name(name) => xlsx::parse_workbook_bytes(bytes),
        _ => parse_bytes(bytes, delimiter),
    }
}

/// Require at least half of the expected headers to be present.
pub fn check_headers(expected: &[&str], found: &[String]) -> Result<(), ValidationError> {
    let (present, missing): (Vec<&str>, Vec<&str>) = expected
        .iter()
        .copied()
        .partition(|h| found.iter().any(|f| f == h));

    if present.len() * 2 < expected.len() {
        return Err(ValidationError::SchemaMismatch {
            missing: missing.into_iter().map(String::from).collect(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_semicolon_file() {
        let sheet = parse_text("name;age\nAlice;30\nBob;25", None).unwrap();

        assert_eq!(sheet.delimiter, ';');
        assert_eq!(sheet.headers, vec!["name", "age"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].get("name"), "Alice");
        assert_eq!(sheet.rows[1].get("age"), "25");
    }

    #[test]
    fn test_detect_delimiter_prefers_comma_on_tie() {
        assert_eq!(detect_delimiter("a;b,c"), ',');
        assert_eq!(detect_delimiter("a;b;c,d"), ';');
        assert_eq!(detect_delimiter("a,b,c"), ',');
        assert_eq!(detect_delimiter("\n\na;b"), ';');
    }

    #[test]
    fn test_quoted_delimiter_and_escaped_quote() {
        let fields = parse_line(r#"1;"Silva; Filhos";"diz ""oi"" já""#, ';');
        assert_eq!(fields, vec!["1", "Silva; Filhos", r#"diz "oi" já"#]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let fields = parse_line("  a ,  \"b\"  , c", ',');
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_blank_lines_do_not_take_line_numbers() {
        let sheet = parse_text("a;b\n1;2\n\n   \n3;4\n", None).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].line, 2);
        assert_eq!(sheet.rows[1].line, 3);
        assert_eq!(sheet.rows[1].index, 1);
    }

    #[test]
    fn test_missing_trailing_values_are_blank() {
        let sheet = parse_text("a;b;c\n1", None).unwrap();

        assert_eq!(sheet.rows[0].get("a"), "1");
        assert!(sheet.rows[0].has("c"));
        assert_eq!(sheet.rows[0].get("c"), "");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let sheet = parse_text("a;b\n1;2;3;4", None).unwrap();
        assert_eq!(sheet.rows[0].values().len(), 2);
    }

    #[test]
    fn test_bom_and_crlf() {
        let sheet = parse_text("\u{feff}CODIGO;NOME\r\n1;Ana\r\n", None).unwrap();
        assert_eq!(sheet.headers, vec!["CODIGO", "NOME"]);
        assert_eq!(sheet.rows[0].get("NOME"), "Ana");
    }

    #[test]
    fn test_mojibake_repaired_before_parsing() {
        let sheet = parse_text("Código;Situação\nA1;NÃƒO", None).unwrap();
        assert_eq!(sheet.headers[0], "Código");
        assert_eq!(sheet.rows[0].get("Código"), "A1");
        assert_eq!(sheet.rows[0].get("Situação"), "NAO");
    }

    #[test]
    fn test_empty_input_error() {
        assert!(matches!(parse_text("", None), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_text("\n \n", None), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes(b"", None), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_latin1_bytes_fall_back() {
        // "NOME;CIDADE\nJosé;São Paulo" in windows-1252
        let mut bytes = b"NOME;CIDADE\nJos".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b";S");
        bytes.push(0xE3);
        bytes.extend_from_slice(b"o Paulo");

        let sheet = parse_bytes(&bytes, None).unwrap();
        assert_ne!(sheet.encoding, "utf-8");
        assert_eq!(sheet.rows[0].get("NOME"), "José");
        assert_eq!(sheet.rows[0].get("CIDADE"), "São Paulo");
    }

    #[test]
    fn test_utf8_bom_bytes() {
        let bytes = b"\xEF\xBB\xBFa,b\n1,2";
        let sheet = parse_bytes(bytes, None).unwrap();
        assert_eq!(sheet.encoding, "utf-8");
        assert_eq!(sheet.headers, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_file_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "CODIGO;NOME\n10;Maria\n").unwrap();

        let sheet = parse_file(file.path(), None).unwrap();
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].get("CODIGO"), "10");
    }

    #[test]
    fn test_parse_upload_by_name() {
        let sheet = parse_upload(b"a;b\n1;2", Some("dados.csv"), None).unwrap();
        assert_eq!(sheet.rows[0].get("b"), "2");

        let sheet = parse_upload(b"a;b\n1;2", None, Some(',')).unwrap();
        assert_eq!(sheet.headers, vec!["a;b"]);

        assert!(matches!(
            parse_upload(b"not a workbook", Some("dados.XLSX"), None),
            Err(CsvError::Excel(_))
        ));
    }

    #[test]
    fn test_check_headers_half_rule() {
        let expected = ["A", "B", "C", "D"];
        let found = vec!["A".to_string(), "B".to_string()];
        assert!(check_headers(&expected, &found).is_ok());

        let found = vec!["A".to_string(), "X".to_string()];
        match check_headers(&expected, &found) {
            Err(ValidationError::SchemaMismatch { missing }) => {
                assert_eq!(missing, vec!["B", "C", "D"]);
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }
}
