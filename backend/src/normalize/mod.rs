//! Field normalizers.
//!
//! Pure string-to-string corrections shared by the subject schemas. Nothing
//! here knows about rows or subjects; the schema modules compose these.
//!
//! All lengths are counted in characters, not bytes.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Characters removed from free-text descriptions.
static FORBIDDEN_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[*#$%@&<>^|~]").expect("static regex"));

/// Leading decimal number, as a lenient float parser would accept it.
static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("static regex")
});

/// Date format used by every date column.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Affirmative tokens for SIM/NAO flags.
pub const YES_TOKENS: &[&str] = &["sim", "s", "yes"];

// =============================================================================
// Basic text helpers
// =============================================================================

/// Keep the first `max` characters.
pub fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Keep only ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Left-pad with zeros up to `width` characters.
pub fn pad_zeros(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        value.to_string()
    } else {
        format!("{}{}", "0".repeat(width - len), value)
    }
}

/// Strip `* # $ % @ & < > ^ | ~` then truncate.
pub fn clean_description(value: &str, max: usize) -> String {
    truncate(&FORBIDDEN_CHARS.replace_all(value, ""), max)
}

/// Case-insensitive lookup in a `(token, canonical)` table.
pub fn map_lower(value: &str, table: &[(&str, &'static str)]) -> Option<&'static str> {
    let lower = value.to_lowercase();
    table
        .iter()
        .find(|(token, _)| *token == lower)
        .map(|(_, canonical)| *canonical)
}

/// Case-insensitive membership test.
pub fn is_one_of(value: &str, tokens: &[&str]) -> bool {
    let lower = value.to_lowercase();
    tokens.iter().any(|t| *t == lower)
}

// =============================================================================
// Numbers
// =============================================================================

/// Parse the leading integer of a string (`"12abc"` → 12).
///
/// Person codes call this for the whole sheet on every row, so no regex.
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let v = value.trim_start();
    let sign_len = usize::from(v.starts_with(|c: char| c == '+' || c == '-'));
    let digits = v[sign_len..]
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    v[..sign_len + digits].parse().ok()
}

/// Parse the leading decimal number of a string (`"1.5kg"` → 1.5).
pub fn parse_leading_float(value: &str) -> Option<f64> {
    LEADING_FLOAT
        .find(value.trim())
        .and_then(|m| m.as_str().parse().ok())
}

/// Monetary amount with two decimals and a dot separator.
///
/// Accepts `1234.56`, `1234,56`, `1.234,56` and `1,234.56`: when both
/// separators appear the rightmost one is the decimal mark. Unparseable
/// values become blank.
pub fn amount(value: &str) -> String {
    let v = value.trim();
    let normalized = match (v.rfind(','), v.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => v.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => v.replace(',', ""),
        _ => v.replacen(',', ".", 1),
    };
    parse_leading_float(&normalized)
        .map(|n| format!("{:.2}", n))
        .unwrap_or_default()
}

/// Dot decimal separators turned into commas; blank stays blank.
pub fn decimal_comma(value: &str) -> String {
    value.replace('.', ",")
}

// =============================================================================
// Enumerations
// =============================================================================

/// `SIM` when the value is an affirmative token, otherwise `NAO`.
pub fn flag(value: &str, yes: &[&str]) -> String {
    let token = if is_one_of(value, yes) { "SIM" } else { "NAO" };
    token.to_string()
}

/// Record status: blank and unknown default to `ATIVO`.
pub fn status(value: &str) -> String {
    if value.trim().is_empty() {
        return "ATIVO".to_string();
    }
    if is_one_of(value, &["ativo", "ativa", "a", "sim", "s", "1", "true"]) {
        return "ATIVO".to_string();
    }
    if is_one_of(
        value,
        &["inativo", "inativa", "i", "não", "nao", "n", "0", "false"],
    ) {
        return "INATIVO".to_string();
    }
    "ATIVO".to_string()
}

const CURRENCIES: &[(&str, &str)] = &[
    ("real", "BRL"),
    ("euro", "EUR"),
    ("peso", "ARS"),
    ("dólar", "USD"),
    ("peso chileno", "CLP"),
    ("peso argentino", "ARS"),
    ("peso filipino", "PHP"),
    ("peso mexicano", "MXN"),
    ("r$", "BRL"),
];

/// Currency name to ISO code; blank is `BRL`, unknown passes through.
pub fn currency(value: &str) -> String {
    match map_lower(value, CURRENCIES) {
        Some(code) => code.to_string(),
        None if value.is_empty() => "BRL".to_string(),
        None => value.to_string(),
    }
}

/// Unit-of-measure synonyms collapsed to the ERP short codes.
pub fn unit_of_measure(value: &str) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    let lower = value.trim().to_lowercase();
    let code = match lower.as_str() {
        "unidade" | "unid" => "UNID",
        "peça" | "pç" | "pc" | "peca" | "não" | "nao" | "no" | "n" => "PC",
        "metro" | "m" => "M",
        "caixa" | "cx" => "CX",
        "conjunto" | "conjunta" | "cj" => "CJ",
        "quilograma" | "quilo" | "kg" => "KG",
        _ => return value.to_string(),
    };
    code.to_string()
}

// =============================================================================
// Documents and contacts
// =============================================================================

/// Legal nature of a person, driving document length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonKind {
    /// CPF, 11 digits.
    Individual,
    /// CNPJ, 14 digits.
    Organization,
}

impl PersonKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FISICA" => Some(PersonKind::Individual),
            "JURIDICA" => Some(PersonKind::Organization),
            _ => None,
        }
    }

    pub fn document_len(&self) -> usize {
        match self {
            PersonKind::Individual => 11,
            PersonKind::Organization => 14,
        }
    }
}

/// CPF/CNPJ digits padded and cut to the length of `kind`.
///
/// Blank stays blank; unknown kind keeps the bare digits.
pub fn document_number(value: &str, kind: Option<PersonKind>) -> String {
    if value.is_empty() {
        return String::new();
    }
    let digits = digits_only(value);
    match kind {
        Some(kind) => truncate(&pad_zeros(&digits, kind.document_len()), kind.document_len()),
        None => digits,
    }
}

/// CPF/CNPJ with the kind inferred from the digit count (≤11 is a CPF).
pub fn document_number_inferred(value: &str) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    let digits = digits_only(value);
    if digits.len() <= 11 {
        document_number(value, Some(PersonKind::Individual))
    } else {
        document_number(value, Some(PersonKind::Organization))
    }
}

/// Split an address list on `, + /` or whitespace, rejoin with `;`.
///
/// Each address keeps 60 characters, the whole list 100.
pub fn email_list(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let joined = value
        .split(|c: char| c == ',' || c == '+' || c == '/' || c == ';' || c.is_whitespace())
        .filter(|e| !e.trim().is_empty())
        .map(|e| truncate(e, 60))
        .collect::<Vec<_>>()
        .join(";");
    truncate(&joined, 100)
}

// =============================================================================
// Dates
// =============================================================================

/// Today as `DD/MM/YYYY` in local time.
pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

/// Parse a `DD/MM/YYYY` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Entry date: blank defaults to today, never earlier than the emission date.
///
/// Dates that do not parse are left alone.
pub fn entry_date(value: &str, emission: &str) -> String {
    if value.is_empty() {
        return today();
    }
    if let (Some(entry), Some(emitted)) = (parse_date(value), parse_date(emission)) {
        if entry < emitted {
            return emission.to_string();
        }
    }
    value.to_string()
}

/// Blank dates default to today.
pub fn date_or_today(value: &str) -> String {
    if value.is_empty() {
        today()
    } else {
        value.to_string()
    }
}
