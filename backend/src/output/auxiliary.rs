//! Secondary import tables derived from the accepted rows.
//!
//! Products yield the NCM status list and the complementary product sheet;
//! people yield the client specialization and sales representative sheets.
//! Columns the pipeline cannot fill are left blank for the user.

use std::collections::BTreeSet;

use crate::api::logs::log_error;
use crate::models::{AuxiliaryOutputs, Row, Subject};
use crate::schema::products;

const NCM_HEADERS: &[&str] = &["Código", "Situação"];

const COMPLEMENTARY_HEADERS: &[&str] = &[
    "Código da empresa",
    "Código do produto",
    "Descrição complementar",
    "Código de barras",
    "Código de barras livre",
    "Identificador do produto",
    "Código de referência",
    "Observação",
    "Descrição para nota fiscal",
    "Informação adicional",
    "Pode ser vendido no eCommerce",
    "Dias para validade",
];

const CLIENT_HEADERS: &[&str] = &[
    "EMPRESA",
    "FILIAL",
    "CODIGO_CLIENTE",
    "CONDICAO_PAGAMENTO",
    "REPRESENTANTE",
    "TRANSPORTADORA",
    "CONSUMIDOR_FINAL",
    "SITUACAO",
];

const REPRESENTATIVE_HEADERS: &[&str] = &[
    "CODIGO_REPRESENTANTE",
    "CODIGO_EMPRESA",
    "CODIGO_FILIAL",
    "CATEGORIA_REPRESENTANTE",
    "VALOR_MIN_PEDIDO",
    "PERC_COMISSAO_PADRAO_PRODUTO",
    "PERC_COMISSAO_PADRAO_SERVICO",
    "PERC_COMISSAO_PAGO_FATURAMENTO",
    "ENCARGOS_NA_BASE_COMISSAO",
    "OUTRAS_DESPESAS_NA_BASE_COMISSAO",
    "VLR_EMBALAGENS_NA_BASE_COMISSAO",
    "SEGURO_NA_BASE_COMISSAO",
    "FRETE_NA_BASE_COMISSAO",
    "IPI_NA_BASE_COMISSAO",
    "ICMS_NA_BASE_COMISSAO",
    "ICMS_SUBS_NA_BASE_COMISSAO",
    "INSS_NA_BASE_COMISSAO",
    "ISS_NA_BASE_COMISSAO",
    "COFINS_FAT_NA_BASE_COMISSAO",
    "COFINS_RET_NA_BASE_COMISSAO",
    "PIS_FAT_NA_BASE_COMISSAO",
    "PIS_RET_NA_BASE_COMISSAO",
    "IRRF_NA_BASE_COMISSAO",
    "CSLL_NA_BASE_COMISSAO",
    "CODIGO_TABELA_PRECO_PADRAO",
    "PERC_COMISSAO_PAGO_REC_TITULO",
    "PAG_COMISSAO_POR_PARCELAS",
];

/// Company and branch every derived people record is filed under.
const DEFAULT_COMPANY: &str = "1";
const DEFAULT_BRANCH: &str = "1";

/// Tables for a subject. Subjects without secondary tables get none.
pub fn generate(subject: Subject, rows: &[Row]) -> AuxiliaryOutputs {
    match subject {
        Subject::Products => AuxiliaryOutputs {
            situacao_ncm: finish("situacao_ncm", ncm_status(rows)),
            complementar_produto: finish("complementar_produto", complementary_product(rows)),
            ..Default::default()
        },
        Subject::People => AuxiliaryOutputs {
            cliente_especializacao: finish("cliente_especializacao", client_specialization(rows)),
            representante_comercial: finish(
                "representante_comercial",
                sales_representative(rows),
            ),
            ..Default::default()
        },
        _ => AuxiliaryOutputs::default(),
    }
}

fn finish(name: &str, table: csv::Result<String>) -> Option<String> {
    table
        .map_err(|e| log_error(format!("Failed to build {}: {}", name, e)))
        .ok()
}

/// Write a `;` table; no trailing newline.
fn render<I>(headers: &[&str], records: I) -> csv::Result<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for record in records {
        writer.write_record(&record)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).trim_end_matches('\n').to_string())
}

/// Unique NCM codes, sorted, all `Ativo`.
pub fn ncm_status(rows: &[Row]) -> csv::Result<String> {
    let codes: BTreeSet<&str> = rows
        .iter()
        .map(|r| r.get(products::NCM).trim())
        .filter(|ncm| !ncm.is_empty())
        .collect();
    render(
        NCM_HEADERS,
        codes
            .into_iter()
            .map(|ncm| vec![ncm.to_string(), "Ativo".to_string()]),
    )
}

pub fn complementary_product(rows: &[Row]) -> csv::Result<String> {
    render(
        COMPLEMENTARY_HEADERS,
        rows.iter().map(|row| {
            let mut record = vec![String::new(); COMPLEMENTARY_HEADERS.len()];
            record[0] = row.get(products::COMPANY).to_string();
            record[1] = row.get(products::CODE).to_string();
            record[8] = row.get(products::DESCRIPTION).to_string();
            record
        }),
    )
}

pub fn client_specialization(rows: &[Row]) -> csv::Result<String> {
    render(
        CLIENT_HEADERS,
        rows.iter()
            .filter(|row| row.get("CONSIDERA_CLIENTE") == "SIM")
            .map(|row| {
                vec![
                    DEFAULT_COMPANY.to_string(),
                    DEFAULT_BRANCH.to_string(),
                    row.get("CODIGO").to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    "NAO".to_string(),
                    "ATIVO".to_string(),
                ]
            }),
    )
}

pub fn sales_representative(rows: &[Row]) -> csv::Result<String> {
    render(
        REPRESENTATIVE_HEADERS,
        rows.iter()
            .filter(|row| row.get("CONSIDERA_REPRESENTANTE") == "SIM")
            .map(|row| {
                let mut record = vec![String::new(); REPRESENTATIVE_HEADERS.len()];
                record[0] = row.get("CODIGO").to_string();
                record[1] = DEFAULT_COMPANY.to_string();
                record[2] = DEFAULT_BRANCH.to_string();
                record
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(index: usize, code: &str, ncm: &str) -> Row {
        Row::from_pairs(
            index,
            [
                (products::CODE, code),
                (products::COMPANY, "1"),
                (products::DESCRIPTION, "Parafuso sextavado"),
                (products::NCM, ncm),
            ],
        )
    }

    #[test]
    fn test_ncm_status_sorted_unique() {
        let rows = vec![
            product(0, "P1", "73181600"),
            product(1, "P2", "73181500"),
            product(2, "P3", "73181600"),
            product(3, "P4", ""),
        ];
        let table = ncm_status(&rows).unwrap();
        assert_eq!(table, "Código;Situação\n73181500;Ativo\n73181600;Ativo");
    }

    #[test]
    fn test_complementary_product_layout() {
        let table = complementary_product(&[product(0, "P1", "")]).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(';').count(), 12);
        assert_eq!(lines[1], "1;P1;;;;;;;Parafuso sextavado;;;");
    }

    #[test]
    fn test_people_tables_filter_on_flags() {
        let rows = vec![
            Row::from_pairs(0, [("CODIGO", "1"), ("CONSIDERA_CLIENTE", "SIM")]),
            Row::from_pairs(1, [("CODIGO", "2"), ("CONSIDERA_REPRESENTANTE", "SIM")]),
            Row::from_pairs(2, [("CODIGO", "3"), ("CONSIDERA_CLIENTE", "NAO")]),
        ];

        let clients = client_specialization(&rows).unwrap();
        assert_eq!(
            clients,
            "EMPRESA;FILIAL;CODIGO_CLIENTE;CONDICAO_PAGAMENTO;REPRESENTANTE;TRANSPORTADORA;CONSUMIDOR_FINAL;SITUACAO\n1;1;1;;;;NAO;ATIVO"
        );

        let reps = sales_representative(&rows).unwrap();
        let lines: Vec<&str> = reps.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].split(';').count(), 27);
        assert!(lines[1].starts_with("2;1;1;;"));
    }

    #[test]
    fn test_generate_per_subject() {
        let rows = vec![product(0, "P1", "73181500")];
        let aux = generate(Subject::Products, &rows);
        assert_eq!(aux.files().len(), 2);
        assert!(aux.cliente_especializacao.is_none());

        assert!(generate(Subject::Receivables, &rows).files().is_empty());
        assert_eq!(generate(Subject::People, &[]).files().len(), 2);
    }

    #[test]
    fn test_descriptions_with_delimiter_are_quoted() {
        let row = Row::from_pairs(
            0,
            [(products::CODE, "P1"), (products::DESCRIPTION, "aço; inox")],
        );
        let table = complementary_product(&[row]).unwrap();
        assert!(table.contains("\"aço; inox\""));
    }
}
