//! Products (`produtos`).

use super::{or_default, KeyPolicy, Schema};
use crate::models::{Row, Subject};
use crate::normalize::{clean_description, decimal_comma, digits_only, flag, is_one_of, pad_zeros};

pub const CODE: &str = "Código";
pub const DESCRIPTION: &str = "Descrição";
pub const COMPANY: &str = "Código da empresa";
pub const FAMILY: &str = "Código da família";
pub const NCM: &str = "NCM";

/// Longest product code the ERP accepts without a family-specific limit.
pub const MAX_CODE_LEN: usize = 23;

pub static PRODUCTS: Schema = Schema {
    subject: Subject::Products,
    headers: &[
        "Código",
        "Descrição",
        "GTIN unidade tributável",
        "Situação",
        "Peso líquido (kg)",
        "Peso bruto (kg)",
        "Comprimento (cm)",
        "Largura (cm)",
        "Altura (cm)",
        "Código da marca",
        "Código da empresa",
        "Código da família",
        "Pode ser vendido",
        "Número do registro na Anvisa",
        "Código da unidade de medida de venda",
        "Código do produto ANP",
        "Descrição do produto conforme ANP",
        "Origem fiscal da mercadoria",
        "Tipo do produto para impostos",
        "Controlar ICMS ST Substituído e FCI Comércio pelo método do estoque PEPS",
        "Especificador de substituição tributária",
        "NCM",
        "Pode ser requisitado",
        "Preço de custo",
        "Código da unidade de medida de estoque",
        "Depósito - Código da filial",
        "Depósito - Código do depósito",
        "Código da unidade de medida auxiliar de estoque",
        "Pode ser comprado",
    ],
    required: &[
        "Código",
        "Código da empresa",
        "Código da família",
        "Código da unidade de medida de estoque",
        "Depósito - Código da filial",
    ],
    rules: &[
        ("Código", code),
        ("Descrição", description),
        ("Situação", situation),
        ("Peso líquido (kg)", measure),
        ("Peso bruto (kg)", measure),
        ("Comprimento (cm)", measure),
        ("Largura (cm)", measure),
        ("Pode ser vendido", allowed),
        ("Número do registro na Anvisa", anvisa_registration),
        ("Origem fiscal da mercadoria", fiscal_origin),
        ("NCM", ncm),
        ("Pode ser requisitado", allowed),
        ("Preço de custo", cost_price),
        ("Depósito - Código do depósito", deposit),
        ("Pode ser comprado", allowed),
    ],
    key: KeyPolicy::FirstWins {
        field: CODE,
        reject_blank: false,
        duplicate_label: "Código duplicado",
        unique_document: None,
    },
    derived_codes: None,
    classification: None,
    unit_fields: &[
        "Código da unidade de medida de estoque",
        "Código da unidade de medida de venda",
        "Código da unidade de medida auxiliar de estoque",
    ],
};

/// Default deposit for products and stock balances.
pub const DEFAULT_DEPOSIT: &str = "1-200";

/// Over-long codes are cleared, which later fails the required check.
fn code(value: &str, _: &Row, _: &[Row]) -> String {
    if value.chars().count() > MAX_CODE_LEN {
        String::new()
    } else {
        value.to_string()
    }
}

fn description(value: &str, _: &Row, _: &[Row]) -> String {
    clean_description(value, 120)
}

fn situation(value: &str, _: &Row, _: &[Row]) -> String {
    if is_one_of(value, &["ativo", "a", "sim"]) {
        "ATIVO".to_string()
    } else if is_one_of(value, &["inativo", "i", "inativa", "não", "nao"]) {
        "INATIVO".to_string()
    } else {
        value.to_string()
    }
}

fn measure(value: &str, _: &Row, _: &[Row]) -> String {
    decimal_comma(value)
}

fn allowed(value: &str, _: &Row, _: &[Row]) -> String {
    flag(value, &["sim", "s", "yes", "pode"])
}

/// Punctuation and ASCII letters removed, left-padded to 13. Longer is cleared.
fn anvisa_registration(value: &str, _: &Row, _: &[Row]) -> String {
    let kept: String = value
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | '/' | '-' | ';' | '?' | '_') && !c.is_ascii_alphabetic())
        .collect();
    match kept.chars().count() {
        0 => String::new(),
        n if n > 13 => String::new(),
        _ => pad_zeros(&kept, 13),
    }
}

fn fiscal_origin(value: &str, _: &Row, _: &[Row]) -> String {
    if is_one_of(value, &["nacional", "brasil"]) {
        "0".to_string()
    } else if is_one_of(value, &["estrangeira", "internacional", "importado"]) {
        "1".to_string()
    } else {
        value.to_string()
    }
}

fn ncm(value: &str, _: &Row, _: &[Row]) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    pad_zeros(&digits_only(value), 8).chars().take(8).collect()
}

fn cost_price(value: &str, _: &Row, _: &[Row]) -> String {
    if value == "N/A" {
        String::new()
    } else {
        decimal_comma(value)
    }
}

fn deposit(value: &str, _: &Row, _: &[Row]) -> String {
    or_default(value, DEFAULT_DEPOSIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(field: &str, value: &str) -> String {
        let rule = PRODUCTS.rule(field).expect("rule registered");
        rule(value, &Row::new(0), &[])
    }

    #[test]
    fn test_code_length_limit() {
        assert_eq!(apply(CODE, &"X".repeat(23)), "X".repeat(23));
        assert_eq!(apply(CODE, &"X".repeat(24)), "");
    }

    #[test]
    fn test_description_cleanup() {
        assert_eq!(apply(DESCRIPTION, "Parafuso #8 * inox"), "Parafuso 8  inox");
        assert_eq!(apply(DESCRIPTION, &"d".repeat(130)).len(), 120);
    }

    #[test]
    fn test_decimal_fields_use_comma() {
        assert_eq!(apply("Peso líquido (kg)", "1.5"), "1,5");
        assert_eq!(apply("Largura (cm)", ""), "");
        assert_eq!(apply("Preço de custo", "10.90"), "10,90");
        assert_eq!(apply("Preço de custo", "N/A"), "");
    }

    #[test]
    fn test_flags_accept_pode() {
        assert_eq!(apply("Pode ser vendido", "Pode"), "SIM");
        assert_eq!(apply("Pode ser comprado", ""), "NAO");
        assert_eq!(apply("Pode ser requisitado", "talvez"), "NAO");
    }

    #[test]
    fn test_registration_and_ncm() {
        assert_eq!(apply("Número do registro na Anvisa", "1.234.567-8"), "0000012345678");
        assert_eq!(apply("Número do registro na Anvisa", "ABC"), "");
        assert_eq!(apply("Número do registro na Anvisa", "12345678901234"), "");
        assert_eq!(apply(NCM, "8471.30"), "00847130");
        assert_eq!(apply(NCM, "8471.30.12.99"), "84713012");
        assert_eq!(apply(NCM, " "), "");
    }

    #[test]
    fn test_enumerations_and_defaults() {
        assert_eq!(apply("Situação", "Inativa"), "INATIVO");
        assert_eq!(apply("Situação", "bloqueado"), "bloqueado");
        assert_eq!(apply("Origem fiscal da mercadoria", "Importado"), "1");
        assert_eq!(apply("Depósito - Código do depósito", ""), "1-200");
        assert_eq!(apply("Depósito - Código do depósito", "2-100"), "2-100");
    }
}
