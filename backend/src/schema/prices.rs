//! Sell and buy price tables.

use super::{KeyPolicy, Schema};
use crate::models::{Row, Subject};
use crate::normalize::truncate;

pub static SELL_PRICE_TABLE: Schema = Schema {
    subject: Subject::SellPriceTable,
    headers: &[
        "TIPO_ITEM",
        "CODIGO",
        "UNIDADE_MEDIDA",
        "CONDICAO_PAGAMENTO",
        "QTD_MAXIMA",
        "VALOR_BASE",
        "PERCENTUAL_DESCONTO",
        "PERCENTUAL_COMISSAO",
        "OBSERVACAO",
    ],
    required: &["TIPO_ITEM", "CODIGO", "UNIDADE_MEDIDA", "VALOR_BASE"],
    rules: &[("TIPO_ITEM", item_type)],
    key: KeyPolicy::None,
    derived_codes: None,
    classification: None,
    unit_fields: &[],
};

pub static BUY_PRICE_TABLE: Schema = Schema {
    subject: Subject::BuyPriceTable,
    headers: &[
        "TIPO",
        "COD_ITEM",
        "COD_ITEM_FORNECEDOR",
        "UNIDADE_MEDIDA",
        "COD_CONDICAO_PAGAMENTO",
        "QUANTIDADE_MAXIMA",
        "PRECO_BASE",
        "PERCENTUAL_DESCONTO",
        "OBSERVACAO",
    ],
    required: &["TIPO", "COD_ITEM", "UNIDADE_MEDIDA", "PRECO_BASE"],
    rules: &[
        ("TIPO", item_type),
        ("COD_ITEM", item_code),
        ("COD_ITEM_FORNECEDOR", supplier_item_code),
        ("UNIDADE_MEDIDA", unit),
        ("COD_CONDICAO_PAGAMENTO", payment_terms),
        ("OBSERVACAO", note),
    ],
    key: KeyPolicy::None,
    derived_codes: None,
    classification: None,
    unit_fields: &[],
};

/// `VP` (product) or `VS` (service); anything else is cleared.
fn item_type(value: &str, _: &Row, _: &[Row]) -> String {
    match value {
        "VP" | "VS" => value.to_string(),
        _ => String::new(),
    }
}

fn item_code(value: &str, _: &Row, _: &[Row]) -> String {
    truncate(value, 23)
}

fn supplier_item_code(value: &str, _: &Row, _: &[Row]) -> String {
    truncate(value, 30)
}

fn unit(value: &str, _: &Row, _: &[Row]) -> String {
    truncate(value, 6)
}

fn payment_terms(value: &str, _: &Row, _: &[Row]) -> String {
    truncate(value, 6)
}

fn note(value: &str, _: &Row, _: &[Row]) -> String {
    truncate(value, 220)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(schema: &Schema, field: &str, value: &str) -> String {
        let rule = schema.rule(field).expect("rule registered");
        rule(value, &Row::new(0), &[])
    }

    #[test]
    fn test_item_type_is_strict() {
        assert_eq!(apply(&SELL_PRICE_TABLE, "TIPO_ITEM", "VP"), "VP");
        assert_eq!(apply(&SELL_PRICE_TABLE, "TIPO_ITEM", "vp"), "");
        assert_eq!(apply(&BUY_PRICE_TABLE, "TIPO", "VS"), "VS");
        assert_eq!(apply(&BUY_PRICE_TABLE, "TIPO", "X"), "");
    }

    #[test]
    fn test_buy_table_length_caps() {
        assert_eq!(apply(&BUY_PRICE_TABLE, "COD_ITEM", &"9".repeat(30)).len(), 23);
        assert_eq!(apply(&BUY_PRICE_TABLE, "COD_ITEM_FORNECEDOR", &"9".repeat(40)).len(), 30);
        assert_eq!(apply(&BUY_PRICE_TABLE, "UNIDADE_MEDIDA", "UNIDADES"), "UNIDAD");
        assert_eq!(apply(&BUY_PRICE_TABLE, "COD_CONDICAO_PAGAMENTO", "30/60/90"), "30/60/");
        assert_eq!(apply(&BUY_PRICE_TABLE, "OBSERVACAO", &"o".repeat(300)).len(), 220);
    }
}
