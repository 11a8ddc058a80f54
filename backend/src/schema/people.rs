//! People (`pessoas`): customers, suppliers, carriers and representatives.

use std::collections::HashSet;

use super::{or_field, DerivedCodes, KeyPolicy, Schema};
use crate::models::{Row, Subject};
use crate::normalize::{
    digits_only, document_number, email_list, flag, is_one_of, map_lower, pad_zeros,
    parse_leading_int, status, truncate, PersonKind, YES_TOKENS,
};

/// First code handed out when a person code has to be replaced.
pub const FIRST_PERSON_CODE: i64 = 50;

pub static PEOPLE: Schema = Schema {
    subject: Subject::People,
    headers: &[
        "CODIGO",
        "NOME",
        "FANTASIA",
        "TIPO_PESSOA",
        "CNPJ_CPF",
        "NUMERO_RG",
        "DATA_EMISSAO_RG",
        "ORGAO_EMISSAO_RG",
        "INSCRICAO_ESTADUAL",
        "INSCRICAO_MUNICIPAL",
        "TIPO_MERCADO",
        "TIPO_ATIVIDADE",
        "BENEFICIO_FISCAL",
        "SUFRAMA",
        "VALIDADE_SUFRAMA",
        "CEP",
        "NUMERO_ENDERECO",
        "COMPLEMENTO_ENDERECO",
        "TELEFONE",
        "EMAIL",
        "DATA_NASCIMENTO",
        "SITUACAO",
        "CONSIDERA_FORNECEDOR",
        "CONSIDERA_CLIENTE",
        "CONSIDERA_REPRESENTANTE",
        "CONSIDERA_TRANSPORTADORA",
        "CONSIDERA_FAVORECIDO",
        "CODIGO_REGIME_TRIBUTARIO",
        "REGIME_ESPECIAL_TRIBUTACAO",
        "CONTRIBUINTE_ICMS",
        "PESSOA_INDUSTRIA",
        "RAMO_ATIVIDADE",
        "EMAIL_NFE",
    ],
    required: &["CODIGO", "NOME"],
    rules: &[
        ("NOME", name),
        ("FANTASIA", trade_name),
        ("TIPO_PESSOA", person_type),
        ("CNPJ_CPF", tax_id),
        ("NUMERO_RG", individual_only),
        ("INSCRICAO_ESTADUAL", digits),
        ("INSCRICAO_MUNICIPAL", digits),
        ("TIPO_MERCADO", market_type),
        ("TIPO_ATIVIDADE", activity_type),
        ("BENEFICIO_FISCAL", tax_benefit),
        ("CEP", postal_code),
        ("NUMERO_ENDERECO", digits),
        ("COMPLEMENTO_ENDERECO", address_complement),
        ("TELEFONE", phone),
        ("EMAIL", emails),
        ("DATA_NASCIMENTO", individual_only),
        ("SITUACAO", situation),
        ("CONSIDERA_FORNECEDOR", yes_no),
        ("CONSIDERA_CLIENTE", yes_no),
        ("CONSIDERA_REPRESENTANTE", yes_no),
        ("CONSIDERA_TRANSPORTADORA", yes_no),
        ("CONSIDERA_FAVORECIDO", yes_no),
        ("CODIGO_REGIME_TRIBUTARIO", tax_regime),
        ("REGIME_ESPECIAL_TRIBUTACAO", special_tax_regime),
        ("CONTRIBUINTE_ICMS", yes_no),
        ("PESSOA_INDUSTRIA", yes_no),
        ("RAMO_ATIVIDADE", branch),
        ("EMAIL_NFE", emails),
    ],
    key: KeyPolicy::FirstWins {
        field: "CODIGO",
        reject_blank: true,
        duplicate_label: "Código duplicado",
        unique_document: Some("CNPJ_CPF"),
    },
    derived_codes: Some(DerivedCodes {
        field: "CODIGO",
        assign: assigned_codes,
    }),
    classification: None,
    unit_fields: &[],
};

/// Final code of every input row, by row index.
///
/// Codes are read as leading integers. The first occurrence of a number keeps
/// it; non-numeric codes and later repeats get the next number from
/// [`FIRST_PERSON_CODE`] that no row uses.
pub fn assigned_codes(rows: &[Row]) -> Vec<String> {
    let originals: Vec<Option<i64>> = rows
        .iter()
        .map(|r| parse_leading_int(r.get("CODIGO").trim()))
        .collect();
    let mut used: HashSet<i64> = originals.iter().flatten().copied().collect();
    let mut seen = HashSet::new();
    let mut next = FIRST_PERSON_CODE;

    originals
        .iter()
        .map(|original| match original {
            Some(n) if seen.insert(*n) => n.to_string(),
            _ => {
                while used.contains(&next) {
                    next += 1;
                }
                used.insert(next);
                next += 1;
                (next - 1).to_string()
            }
        })
        .collect()
}

fn name(value: &str, _: &Row, _: &[Row]) -> String {
    truncate(value, 100)
}

fn trade_name(value: &str, row: &Row, _: &[Row]) -> String {
    or_field(value, row, "NOME", 50)
}

/// Role words say nothing about the legal nature, so those fall back to the
/// document length like a blank value does.
fn person_type(value: &str, row: &Row, _: &[Row]) -> String {
    const ROLES: &[&str] = &[
        "transportadora",
        "transportador",
        "cliente",
        "representante",
        "vendedor",
        "ambos",
    ];
    if value.is_empty() || is_one_of(value, ROLES) {
        return match digits_only(row.get("CNPJ_CPF")).len() {
            11 => "FISICA",
            _ => "JURIDICA",
        }
        .to_string();
    }
    if is_one_of(value, &["pessoa física", "pessoa fisica", "cpf", "pf"]) {
        return "FISICA".to_string();
    }
    if is_one_of(value, &["pj", "jurídica", "juridica", "cnpj"]) {
        return "JURIDICA".to_string();
    }
    value.to_string()
}

fn tax_id(value: &str, row: &Row, _: &[Row]) -> String {
    document_number(value, PersonKind::from_code(row.get("TIPO_PESSOA")))
}

fn individual_only(value: &str, row: &Row, _: &[Row]) -> String {
    if row.get("TIPO_PESSOA") == "JURIDICA" {
        String::new()
    } else {
        value.to_string()
    }
}

fn digits(value: &str, _: &Row, _: &[Row]) -> String {
    digits_only(value)
}

fn market_type(value: &str, _: &Row, _: &[Row]) -> String {
    if value.is_empty() || is_one_of(value, &["i", "interno", "brasil", "nacional"]) {
        return "INTERNO".to_string();
    }
    if is_one_of(value, &["e", "ex", "externo", "exterior", "internacional"]) {
        return "EXTERNO".to_string();
    }
    value.to_string()
}

fn activity_type(value: &str, _: &Row, _: &[Row]) -> String {
    const ACTIVITIES: &[(&str, &str)] = &[
        ("outros", "OUTROS"),
        ("prestador serviço", "PRESTADOR_SERVICO"),
        ("cooperativo", "COOPERATIVA"),
        ("ind", "INDUSTRIA"),
        ("comércio", "COMERCIO"),
        ("imobiliaria", "ATIVIDADE_IMOBILIARIA"),
        ("comercio", "COMERCIO"),
    ];
    map_lower(value, ACTIVITIES)
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

fn tax_benefit(value: &str, _: &Row, _: &[Row]) -> String {
    const BENEFITS: &[&str] = &[
        "NAO_POSSUI",
        "ZONA_FRANCA_MANAUS",
        "ZONA_FRANCA",
        "AREA_LIVRE_COMERCIO",
        "AMAZONIA_OCIDENTAL",
    ];
    if value.is_empty() {
        String::new()
    } else if BENEFITS.contains(&value) {
        value.to_string()
    } else {
        "NAO_POSSUI".to_string()
    }
}

fn postal_code(value: &str, _: &Row, _: &[Row]) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    let digits = digits_only(value);
    if digits.len() <= 8 {
        pad_zeros(&digits, 8)
    } else {
        String::new()
    }
}

fn address_complement(value: &str, _: &Row, _: &[Row]) -> String {
    truncate(value, 20)
}

fn phone(value: &str, _: &Row, _: &[Row]) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '.' | '-') && !c.is_whitespace())
        .collect()
}

fn emails(value: &str, _: &Row, _: &[Row]) -> String {
    email_list(value)
}

fn situation(value: &str, _: &Row, _: &[Row]) -> String {
    status(value)
}

fn yes_no(value: &str, _: &Row, _: &[Row]) -> String {
    flag(value, YES_TOKENS)
}

fn tax_regime(value: &str, _: &Row, _: &[Row]) -> String {
    if is_one_of(
        value,
        &["simples", "microempresa", "empresario", "microempresario", "simples nacional"],
    ) {
        return "SIMPLES".to_string();
    }
    if is_one_of(value, &["real", "lucro real", "normal"]) {
        return "NORMAL".to_string();
    }
    super::or_default(value, "SIMPLES")
}

/// Unknown values are cleared rather than passed through.
fn special_tax_regime(value: &str, _: &Row, _: &[Row]) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let regime = match trimmed.to_lowercase().as_str() {
        "micro" | "micro empresa" | "microempresa" => "MICRO_EMPRESA",
        "me epp" | "me" | "meepp" => "ME_EPP",
        "sociedade" => "SOCIEDADE",
        "estimativa" => "ESTIMATIVA",
        "cooperativa" => "COOPERATIVA",
        _ => "",
    };
    regime.to_string()
}

fn branch(value: &str, _: &Row, _: &[Row]) -> String {
    if value.chars().count() > 5 {
        String::new()
    } else {
        value.to_string()
    }
}
