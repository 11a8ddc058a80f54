//! Opening stock balance (`saldo_inicial_estoque`).

use super::products::DEFAULT_DEPOSIT;
use super::{or_default, KeyPolicy, Schema};
use crate::models::{Row, Subject};

pub static OPENING_STOCK_BALANCE: Schema = Schema {
    subject: Subject::OpeningStockBalance,
    headers: &[
        "CODIGO_EMPRESA",
        "CODIGO_FILIAL",
        "CODIGO_PRODUTO",
        "CODIGO_DEPOSITO",
        "CODIGO_TRANSACAO_ESTOQUE",
        "QUANTIDADE",
        "VALOR",
        "NUMERO_SERIE",
        "CODIGO_LOTE",
        "DATA_FABRICACAO_LOTE_SERIE",
        "DATA_VALIDADE_LOTE_SERIE",
    ],
    required: &["CODIGO_EMPRESA", "CODIGO_FILIAL", "CODIGO_PRODUTO"],
    rules: &[
        ("CODIGO_DEPOSITO", deposit),
        ("CODIGO_TRANSACAO_ESTOQUE", stock_transaction),
    ],
    key: KeyPolicy::None,
    derived_codes: None,
    classification: None,
    unit_fields: &[],
};

fn deposit(value: &str, _: &Row, _: &[Row]) -> String {
    or_default(value, DEFAULT_DEPOSIT)
}

fn stock_transaction(value: &str, _: &Row, _: &[Row]) -> String {
    or_default(value, "90222")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let row = Row::new(0);
        let deposit = OPENING_STOCK_BALANCE.rule("CODIGO_DEPOSITO").unwrap();
        let transaction = OPENING_STOCK_BALANCE.rule("CODIGO_TRANSACAO_ESTOQUE").unwrap();
        assert_eq!(deposit("", &row, &[]), "1-200");
        assert_eq!(deposit("3-100", &row, &[]), "3-100");
        assert_eq!(transaction("", &row, &[]), "90222");
    }
}
