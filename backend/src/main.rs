//! Sheetfix CLI - Validate and correct ERP migration spreadsheets
//!
//! # Main Commands
//!
//! ```bash
//! sheetfix validate pessoas.csv --subject pessoas -o corrigido.csv
//! sheetfix validate produtos.xlsx --subject produtos --erp --aux-dir extras/
//! sheetfix serve                      # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! sheetfix parse input.csv            # Just parse to JSON
//! sheetfix subjects                   # List subjects and their headers
//! ```

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use sheetfix::{
    parse_file, subject_catalogue, validate_file, AuxiliaryOutputs, ErpClient, LookupSession,
    ValidateOptions, ValidationResult,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Exclusions printed before the list is cut short.
const SHOWN_EXCLUSIONS: usize = 10;

#[derive(Parser)]
#[command(name = "sheetfix")]
#[command(about = "Validate and correct ERP migration spreadsheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a CSV or Excel file and write the corrected CSV
    Validate {
        /// Input file (.csv, .txt, .xlsx, .xls)
        input: PathBuf,

        /// Subject key (pessoas, produtos, plano_financeiro, ...)
        #[arg(short, long)]
        subject: String,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file for the corrected CSV (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the full JSON report here
        #[arg(long)]
        report: Option<PathBuf>,

        /// Directory for the auxiliary tables
        #[arg(long)]
        aux_dir: Option<PathBuf>,

        /// Check product families against the ERP (needs ERP_TOKEN)
        #[arg(long)]
        erp: bool,
    },

    /// Parse a file and output its rows as JSON
    Parse {
        /// Input file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List subjects with their headers and required fields
    Subjects {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            input,
            subject,
            delimiter,
            output,
            report,
            aux_dir,
            erp,
        } => {
            cmd_validate(
                &input,
                &subject,
                delimiter,
                output.as_deref(),
                report.as_deref(),
                aux_dir.as_deref(),
                erp,
                &mut io::stdout(),
            )
            .await
        }

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref(), &mut io::stdout()),

        Commands::Subjects { json } => cmd_subjects(json),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Validate one file. Only the corrected CSV goes to `out`; progress and the
/// report summary go to stderr.
#[allow(clippy::too_many_arguments)]
async fn cmd_validate(
    input: &Path,
    subject: &str,
    delimiter: Option<char>,
    output: Option<&Path>,
    report: Option<&Path>,
    aux_dir: Option<&Path>,
    erp: bool,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = ValidateOptions::for_subject(subject)?;
    if let Some(d) = delimiter {
        options = options.with_delimiter(d);
    }
    if erp {
        let credential = ErpClient::credential_from_env()?;
        let client = ErpClient::from_env();
        eprintln!("🔎 ERP lookups against {}", client.base_url());
        options = options.with_lookup(LookupSession::new(Arc::new(client), credential));
    }

    eprintln!("📄 Validating: {} as {}", input.display(), options.subject.label());
    let result = validate_file(input, &options).await?;

    print_report(&result);

    write_output(&result.corrected_csv, output, out)?;

    if let Some(path) = report {
        fs::write(path, serde_json::to_string_pretty(&result)?)?;
        eprintln!("💾 Report written to: {}", path.display());
    }

    if let Some(dir) = aux_dir {
        fs::create_dir_all(dir)?;
        for (path, content) in aux_file_paths(dir, &result.auxiliary) {
            fs::write(&path, content)?;
            eprintln!("💾 Auxiliary table written to: {}", path.display());
        }
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

/// Target path and content of every auxiliary table present.
fn aux_file_paths<'a>(dir: &Path, auxiliary: &'a AuxiliaryOutputs) -> Vec<(PathBuf, &'a str)> {
    auxiliary
        .files()
        .into_iter()
        .map(|(stem, content)| (dir.join(format!("{}.csv", stem)), content))
        .collect()
}

fn print_report(result: &ValidationResult) {
    eprintln!("\n📊 {}", result.summary());
    if result.is_valid {
        eprintln!("   ✅ No rows excluded");
        return;
    }
    for excluded in result.excluded_details.iter().take(SHOWN_EXCLUSIONS) {
        eprintln!("   ❌ Line {}: {}", excluded.line, excluded.reason);
    }
    if result.excluded_records > SHOWN_EXCLUSIONS {
        eprintln!("   ... +{} more", result.excluded_records - SHOWN_EXCLUSIONS);
    }
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let sheet = parse_file(input, delimiter)?;

    eprintln!("   Encoding: {}", sheet.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        sheet.delimiter,
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", sheet.headers.join(", "));
    eprintln!("✅ Parsed {} rows", sheet.rows.len());

    let records: Vec<Value> = sheet
        .rows
        .iter()
        .map(|row| {
            let fields: Map<String, Value> = sheet
                .headers
                .iter()
                .map(|h| (h.clone(), Value::String(row.get(h).to_string())))
                .collect();
            Value::Object(fields)
        })
        .collect();

    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output, out)?;

    Ok(())
}

fn cmd_subjects(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&subject_catalogue())?);
        return Ok(());
    }

    for info in subject_catalogue() {
        println!("📋 {} ({})", info.label, info.key);
        println!("   Headers: {}", info.headers.len());
        println!("   Required: {}", info.required.join(", "));
        if info.uses_erp_lookup {
            println!("   ERP lookup: family + company");
        }
        println!();
    }
    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    sheetfix::api::start_server(port).await
}

/// Write `content` to `path`, or to `out` when no path is given.
fn write_output(
    content: &str,
    path: Option<&Path>,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            writeln!(out, "{}", content)?;
            out.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetfix::{schema, Subject};
    use tempfile::TempDir;

    fn price_table_csv() -> String {
        let headers = schema(Subject::SellPriceTable).headers;
        let row: Vec<&str> = headers
            .iter()
            .map(|h| match *h {
                "TIPO_ITEM" => "vp",
                "CODIGO" => "P1",
                "UNIDADE_MEDIDA" => "un",
                _ => "",
            })
            .collect();
        format!("{}\n{}", headers.join(";"), row.join(";"))
    }

    #[test]
    fn test_write_output_to_writer() {
        let mut buffer = Vec::new();
        write_output("a;b\n1;2", None, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "a;b\n1;2\n");
    }

    #[test]
    fn test_write_output_to_file_leaves_writer_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut buffer = Vec::new();

        write_output("a;b\n1;2", Some(&path), &mut buffer).unwrap();

        assert!(buffer.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "a;b\n1;2");
    }

    #[tokio::test]
    async fn test_validate_stdout_is_only_the_corrected_csv() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("tabela.csv");
        fs::write(&input, price_table_csv()).unwrap();

        let options = ValidateOptions::new(Subject::SellPriceTable);
        let expected = validate_file(&input, &options).await.unwrap().corrected_csv;

        let mut buffer = Vec::new();
        cmd_validate(
            &input,
            "tabela_preco_venda",
            None,
            None,
            None,
            None,
            false,
            &mut buffer,
        )
        .await
        .unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), format!("{}\n", expected));
    }

    #[tokio::test]
    async fn test_validate_writes_report_and_no_stdout_with_output_path() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("tabela.csv");
        let output = dir.path().join("corrigido.csv");
        let report = dir.path().join("relatorio.json");
        fs::write(&input, price_table_csv()).unwrap();

        let mut buffer = Vec::new();
        cmd_validate(
            &input,
            "tabela_preco_venda",
            None,
            Some(&output),
            Some(&report),
            None,
            false,
            &mut buffer,
        )
        .await
        .unwrap();

        assert!(buffer.is_empty());
        let corrected = fs::read_to_string(&output).unwrap();
        assert!(corrected.starts_with("TIPO_ITEM;"));
        let json: Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(json["correctedCsv"], Value::String(corrected));
    }

    #[test]
    fn test_aux_file_paths_use_table_stems() {
        let dir = Path::new("extras");
        let auxiliary = AuxiliaryOutputs {
            situacao_ncm: Some("NCM;SITUACAO".to_string()),
            complementar_produto: Some("CODIGO".to_string()),
            ..AuxiliaryOutputs::default()
        };

        let paths = aux_file_paths(dir, &auxiliary);

        assert_eq!(
            paths,
            vec![
                (dir.join("situacao_ncm.csv"), "NCM;SITUACAO"),
                (dir.join("complementar_produto.csv"), "CODIGO"),
            ]
        );
        assert!(aux_file_paths(dir, &AuxiliaryOutputs::default()).is_empty());
    }
}
