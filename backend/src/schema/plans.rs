//! Hierarchical plans: financial plan, accounting plan and cost centers.
//!
//! All three carry a dotted classification and a numeric code that is
//! renumbered (not excluded) when blank or repeated.

use super::{or_default, or_field, ClassificationRule, KeyPolicy, Schema};
use crate::classification::{self, MAX_COST_CENTER_LEVEL};
use crate::models::{Row, Subject};
use crate::normalize::{clean_description, flag, is_one_of, map_lower, parse_leading_int, YES_TOKENS};

pub const CLASSIFICATION: &str = "classificacao";

pub static FINANCIAL_PLAN: Schema = Schema {
    subject: Subject::FinancialPlan,
    headers: &[
        "codigoconta",
        "classificacao",
        "descricao",
        "abreviatura",
        "codigodotipofinanceiro",
        "analiticasintetica",
        "natureza",
        "nivel",
        "contacontabilvinculada",
    ],
    required: &["classificacao", "descricao"],
    rules: &[
        ("classificacao", classification_code),
        ("descricao", description),
        ("abreviatura", abbreviation),
        ("codigodotipofinanceiro", financial_type),
        ("analiticasintetica", account_kind),
        ("natureza", financial_nature),
        ("nivel", level),
    ],
    key: KeyPolicy::Renumbered {
        field: "codigoconta",
    },
    derived_codes: None,
    classification: Some(ClassificationRule {
        field: CLASSIFICATION,
        check_top_level: true,
        max_level: None,
    }),
    unit_fields: &[],
};

pub static ACCOUNTING_PLAN: Schema = Schema {
    subject: Subject::AccountingPlan,
    headers: &[
        "codigoconta",
        "classificacao",
        "descricao",
        "abreviatura",
        "definicaodegrupo",
        "analiticasintetica",
        "natureza",
        "nivel",
        "formaderateio",
        "exigecontaauxiliar",
        "aceitalancamentomanual",
    ],
    required: &["classificacao", "descricao"],
    rules: &[
        ("classificacao", classification_code),
        ("descricao", description),
        ("abreviatura", abbreviation),
        ("definicaodegrupo", group_definition),
        ("analiticasintetica", account_kind),
        ("natureza", accounting_nature),
        ("nivel", level),
        ("formaderateio", apportionment),
        ("exigecontaauxiliar", requires_auxiliary),
        ("aceitalancamentomanual", manual_entry),
    ],
    key: KeyPolicy::Renumbered {
        field: "codigoconta",
    },
    derived_codes: None,
    classification: Some(ClassificationRule {
        field: CLASSIFICATION,
        check_top_level: true,
        max_level: None,
    }),
    unit_fields: &[],
};

pub static COST_CENTER: Schema = Schema {
    subject: Subject::CostCenter,
    headers: &[
        "codigodocentrodecusto",
        "classificacao",
        "descricao",
        "abreviatura",
        "analiticasintetica",
        "natureza",
        "tipodocentrodecusto",
        "nivel",
    ],
    required: &["classificacao", "descricao"],
    rules: &[
        ("classificacao", cost_center_classification),
        ("descricao", description),
        ("abreviatura", abbreviation),
        ("analiticasintetica", account_kind),
        ("natureza", cost_center_nature),
        ("tipodocentrodecusto", cost_center_type),
        ("nivel", cost_center_level),
    ],
    key: KeyPolicy::Renumbered {
        field: "codigodocentrodecusto",
    },
    derived_codes: None,
    classification: Some(ClassificationRule {
        field: CLASSIFICATION,
        check_top_level: false,
        max_level: Some(MAX_COST_CENTER_LEVEL),
    }),
    unit_fields: &[],
};

// =============================================================================
// Shared rules
// =============================================================================

fn classification_code(value: &str, _: &Row, _: &[Row]) -> String {
    classification::normalize(value)
}

fn description(value: &str, _: &Row, _: &[Row]) -> String {
    clean_description(value, 100)
}

fn abbreviation(value: &str, row: &Row, _: &[Row]) -> String {
    or_field(value, row, "descricao", 20)
}

fn account_kind(value: &str, _: &Row, _: &[Row]) -> String {
    if is_one_of(value, &["sintetico", "sintético", "sintetica", "sintética"]) {
        "SINTETICA".to_string()
    } else if is_one_of(value, &["analitico", "analítico", "analitica", "analítica"]) {
        "ANALITICA".to_string()
    } else {
        value.to_string()
    }
}

/// Standard spellings of an account nature.
fn known_nature(value: &str) -> Option<&'static str> {
    map_lower(
        value,
        &[
            ("credor", "CREDORA"),
            ("credora", "CREDORA"),
            ("devedor", "DEVEDORA"),
            ("devedora", "DEVEDORA"),
            ("ambas", "AMBAS"),
            ("ambos", "AMBAS"),
        ],
    )
}

/// Level recomputed from the (already formatted) classification.
fn level(value: &str, row: &Row, _: &[Row]) -> String {
    let computed = classification::level(row.get(CLASSIFICATION));
    match parse_leading_int(value) {
        Some(n) if n == computed as i64 => value.to_string(),
        _ => computed.to_string(),
    }
}

// =============================================================================
// Financial plan
// =============================================================================

/// 1 for expenses, 2 for revenues. Blank follows the nature column.
fn financial_type(value: &str, row: &Row, _: &[Row]) -> String {
    const TYPES: &[(&str, &str)] = &[
        ("despesas financeiras", "1"),
        ("despesas", "1"),
        ("despesa", "1"),
        ("receitas financeiras", "2"),
        ("receita", "2"),
        ("receitas", "2"),
        ("receita financeira", "2"),
    ];
    if let Some(code) = map_lower(value, TYPES) {
        return code.to_string();
    }
    if value.is_empty() {
        return if row.get("natureza") == "DEVEDORA" { "1" } else { "2" }.to_string();
    }
    if value == "1" || value == "2" {
        value.to_string()
    } else {
        "1".to_string()
    }
}

fn financial_nature(value: &str, row: &Row, _: &[Row]) -> String {
    if let Some(nature) = known_nature(value) {
        return nature.to_string();
    }
    if value.is_empty() {
        return if row.get("codigodotipofinanceiro") == "1" {
            "DEVEDORA"
        } else {
            "CREDORA"
        }
        .to_string();
    }
    value.to_string()
}

// =============================================================================
// Accounting plan
// =============================================================================

fn group_definition(value: &str, _: &Row, _: &[Row]) -> String {
    const GROUPS: &[(&str, &str)] = &[
        ("ativa", "ATIVO"),
        ("ativo", "ATIVO"),
        ("passivo", "PASSIVO"),
        ("passiva", "PASSIVO"),
        ("liquido", "PATRIMONIO_LIQUIDO"),
        ("patrimonio liquido", "PATRIMONIO_LIQUIDO"),
        ("patrimônio liquido", "PATRIMONIO_LIQUIDO"),
        ("contas resultado", "CONTAS_RESULTADO"),
        ("conta resultado", "CONTAS_RESULTADO"),
        ("resultados", "CONTAS_RESULTADO"),
        ("resultado", "CONTAS_RESULTADO"),
        ("conta compensação", "CONTAS_COMPENSACAO"),
        ("contas compensação", "CONTAS_COMPENSACAO"),
        ("compensação", "CONTAS_COMPENSACAO"),
        ("outro", "OUTROS"),
        ("outros", "OUTROS"),
        ("outra", "OUTROS"),
        ("outras", "OUTROS"),
    ];
    match map_lower(value, GROUPS) {
        Some(group) => group.to_string(),
        None => or_default(value, "OUTROS"),
    }
}

/// Nature derived from the group, then from description keywords.
///
/// Reducing accounts (`(-)` in the description) take the opposite nature of
/// their group.
fn accounting_nature(value: &str, row: &Row, _: &[Row]) -> String {
    let lower = value.to_lowercase();
    let synthetic = row.get("analiticasintetica") == "SINTETICA";
    match lower.as_str() {
        "credor" | "credora" => return "CREDORA".to_string(),
        "devedor" | "devedora" => return "DEVEDORA".to_string(),
        "ambas" | "ambos" if !synthetic => return "AMBAS".to_string(),
        _ => {}
    }

    let canonical = matches!(value, "CREDORA" | "DEVEDORA" | "AMBAS");
    if !value.is_empty() && canonical {
        return value.to_string();
    }

    let group = row.get("definicaodegrupo");
    let description = row.get("descricao").to_lowercase();
    let reducing = description.contains("(-)") || description.contains("( - )");

    let nature = match group {
        "ATIVO" if reducing => "CREDORA",
        "ATIVO" => "DEVEDORA",
        "PASSIVO" | "CONTAS_RESULTADO" | "PATRIMONIO_LIQUIDO" if reducing => "DEVEDORA",
        "PASSIVO" | "CONTAS_RESULTADO" | "PATRIMONIO_LIQUIDO" => "CREDORA",
        _ if ["despesa", "custo", "resultado", "provisão"]
            .iter()
            .any(|k| description.contains(k)) =>
        {
            "DEVEDORA"
        }
        _ if description.contains("receita") => "CREDORA",
        _ => "DEVEDORA",
    };
    nature.to_string()
}

fn apportionment(value: &str, row: &Row, _: &[Row]) -> String {
    if is_one_of(value, &["sem rateio", "sem", "não", "nao"]) {
        return "SEM_RATEIO".to_string();
    }
    if is_one_of(value, &["com rateio", "sim", "rateio manual", "manual"]) {
        return "RATEIO_MANUAL".to_string();
    }
    if value == "SEM_RATEIO" || value == "RATEIO_MANUAL" {
        return value.to_string();
    }
    let default = match row.get("definicaodegrupo") {
        "CONTAS_RESULTADO" => "RATEIO_MANUAL",
        _ => "SEM_RATEIO",
    };
    default.to_string()
}

fn requires_auxiliary(_: &str, _: &Row, _: &[Row]) -> String {
    "NAO".to_string()
}

fn manual_entry(value: &str, _: &Row, _: &[Row]) -> String {
    flag(value, YES_TOKENS)
}

// =============================================================================
// Cost center
// =============================================================================

fn cost_center_classification(value: &str, _: &Row, _: &[Row]) -> String {
    classification::normalize_capped(value, MAX_COST_CENTER_LEVEL)
}

fn cost_center_nature(value: &str, _: &Row, _: &[Row]) -> String {
    match known_nature(value) {
        Some(nature) => nature.to_string(),
        None => or_default(value, "DEVEDORA"),
    }
}

fn cost_center_type(value: &str, _: &Row, _: &[Row]) -> String {
    const TYPES: &[(&str, &str)] = &[
        ("administrativa", "ADMINISTRATIVO"),
        ("adm", "ADMINISTRATIVO"),
        ("admin", "ADMINISTRATIVO"),
        ("administrativo", "ADMINISTRATIVO"),
        ("operacional indireto", "OPERACIONAL_INDIRETO"),
        ("indireto", "OPERACIONAL_INDIRETO"),
        ("operacional direto", "OPERACIONAL_DIRETO"),
        ("direto", "OPERACIONAL_DIRETO"),
        ("operacional", "OPERACIONAL_DIRETO"),
        ("comercial", "COMERCIAL"),
        ("finança", "FINANCEIRO"),
        ("finanças", "FINANCEIRO"),
        ("financeira", "FINANCEIRO"),
        ("financeiro", "FINANCEIRO"),
    ];
    match map_lower(value, TYPES) {
        Some(kind) => kind.to_string(),
        None => or_default(value, "ADMINISTRATIVO"),
    }
}

fn cost_center_level(value: &str, row: &Row, all: &[Row]) -> String {
    if classification::level(row.get(CLASSIFICATION)) > MAX_COST_CENTER_LEVEL {
        return String::new();
    }
    level(value, row, all)
}
