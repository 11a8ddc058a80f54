//! Receivable and payable titles (`titulos_receber`, `titulos_pagar`).
//!
//! Both share every rule except the defaults for title type and transaction.

use super::{or_default, KeyPolicy, Schema};
use crate::models::{Row, Subject};
use crate::normalize::{amount, currency, date_or_today, document_number_inferred, entry_date, pad_zeros, truncate};

const KEY: KeyPolicy = KeyPolicy::FirstWins {
    field: "NUMERO_TITULO",
    reject_blank: false,
    duplicate_label: "Número de título duplicado",
    unique_document: None,
};

const REQUIRED: &[&str] = &["EMPRESA", "FILIAL", "NUMERO_TITULO", "VALOR"];

pub static RECEIVABLES: Schema = Schema {
    subject: Subject::Receivables,
    headers: &[
        "EMPRESA",
        "FILIAL",
        "NUMERO_TITULO",
        "TIPO_TITULO",
        "CLIENTE",
        "CNPJ_CPF",
        "SACADO",
        "VALOR",
        "FORMA_PAGAMENTO",
        "TRANSACAO",
        "DATA_EMISSAO",
        "DATA_ENTRADA",
        "VENCIMENTO",
        "PRORROGA_JUROS",
        "PERCENTUAL_DESCONTO",
        "VALOR_DESCONTO",
        "PORTADOR",
        "CARTEIRA",
        "TIPO_JUROS",
        "PERCENTUAL_JUROS",
        "PERCENTUAL_MULTA",
        "MOEDA",
        "COTACAO_MOEDA",
        "OBSERVACAO",
        "NUMERO_CHEQUE",
        "NOSSO_NUMERO",
        "CONTA_FINANCEIRA",
        "CENTRO_CUSTO",
    ],
    required: REQUIRED,
    rules: &[
        ("NUMERO_TITULO", title_number),
        ("TIPO_TITULO", receivable_type),
        ("CNPJ_CPF", tax_id),
        ("VALOR", value_amount),
        ("TRANSACAO", receivable_transaction),
        ("DATA_ENTRADA", entry),
        ("VENCIMENTO", due_date),
        ("PORTADOR", bearer),
        ("CARTEIRA", portfolio),
        ("MOEDA", currency_code),
    ],
    key: KEY,
    derived_codes: None,
    classification: None,
    unit_fields: &[],
};

pub static PAYABLES: Schema = Schema {
    subject: Subject::Payables,
    headers: &[
        "EMPRESA",
        "FILIAL",
        "NUMERO_TITULO",
        "TIPO_TITULO",
        "FORNECEDOR",
        "CNPJ_CPF",
        "FAVORECIDO",
        "VALOR",
        "FORMA_PAGAMENTO",
        "TRANSACAO",
        "DATA_EMISSAO",
        "DATA_ENTRADA",
        "VENCIMENTO",
        "PRORROGA_JUROS",
        "PERCENTUAL_DESCONTO",
        "VALOR_DESCONTO",
        "PORTADOR",
        "CARTEIRA",
        "TIPO_JUROS",
        "PERCENTUAL_JUROS",
        "PERCENTUAL_MULTA",
        "MOEDA",
        "COTACAO_MOEDA",
        "OBSERVACAO",
        "CONTA_FINANCEIRA",
        "CENTRO_CUSTO",
    ],
    required: REQUIRED,
    rules: &[
        ("NUMERO_TITULO", title_number),
        ("TIPO_TITULO", payable_type),
        ("CNPJ_CPF", tax_id),
        ("VALOR", value_amount),
        ("TRANSACAO", payable_transaction),
        ("DATA_ENTRADA", entry),
        ("VENCIMENTO", due_date),
        ("PORTADOR", bearer),
        ("CARTEIRA", portfolio),
        ("MOEDA", currency_code),
    ],
    key: KEY,
    derived_codes: None,
    classification: None,
    unit_fields: &[],
};

fn title_number(value: &str, _: &Row, _: &[Row]) -> String {
    truncate(value, 15)
}

/// Three characters at most; anything longer falls back to the default.
fn title_type(value: &str, default: &str) -> String {
    if value.chars().count() > 3 {
        default.to_string()
    } else {
        or_default(value, default)
    }
}

fn receivable_type(value: &str, _: &Row, _: &[Row]) -> String {
    title_type(value, "NFS")
}

fn payable_type(value: &str, _: &Row, _: &[Row]) -> String {
    title_type(value, "NFC")
}

fn tax_id(value: &str, _: &Row, _: &[Row]) -> String {
    document_number_inferred(value)
}

fn value_amount(value: &str, _: &Row, _: &[Row]) -> String {
    amount(value)
}

fn receivable_transaction(value: &str, _: &Row, _: &[Row]) -> String {
    or_default(value, "90300")
}

fn payable_transaction(value: &str, _: &Row, _: &[Row]) -> String {
    or_default(value, "90500")
}

fn entry(value: &str, row: &Row, _: &[Row]) -> String {
    entry_date(value, row.get("DATA_EMISSAO"))
}

fn due_date(value: &str, _: &Row, _: &[Row]) -> String {
    date_or_today(value)
}

fn padded_or(value: &str, width: usize, fallback: &str) -> String {
    if value.is_empty() || value.chars().count() > width {
        fallback.to_string()
    } else {
        pad_zeros(value, width)
    }
}

fn bearer(value: &str, _: &Row, _: &[Row]) -> String {
    padded_or(value, 3, "999")
}

fn portfolio(value: &str, _: &Row, _: &[Row]) -> String {
    padded_or(value, 2, "99")
}

fn currency_code(value: &str, _: &Row, _: &[Row]) -> String {
    currency(value)
}
