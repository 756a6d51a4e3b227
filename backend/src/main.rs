//! Payroll CLI - ingest salary sheets and convert Preeti text
//!
//! ```bash
//! payroll serve                         # Start HTTP server (port 3000)
//! payroll check salary.xlsx             # Extension and size check only
//! payroll parse salary.xlsx             # Ingest first sheet, print JSON
//! payroll parse salary.xlsx --all-sheets --convert-legacy
//! payroll convert "/fd axfb'/"          # Preeti → Unicode
//! payroll export salary.csv -o out.csv  # Accepted rows as CSV
//! ```

use clap::{Parser, Subcommand};
use payroll::{
    employees_to_csv, parse, parse_all_sheets, validate_structure, write_errors, AppConfig,
    HeaderStyle, IngestOptions, UploadFile,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "payroll")]
#[command(
    about = "Ingest payroll spreadsheets and convert Preeti text to Unicode",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a file's extension and size without reading it
    Check {
        /// Input .xlsx, .xls or .csv file
        input: PathBuf,
    },

    /// Ingest a salary sheet and output the result as JSON
    Parse {
        /// Input .xlsx, .xls or .csv file
        input: PathBuf,

        /// Ingest every sheet instead of the first
        #[arg(short, long)]
        all_sheets: bool,

        /// Convert Preeti name, designation and department to Unicode
        #[arg(short, long)]
        convert_legacy: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert Preeti text to Unicode Devanagari
    Convert {
        /// Text to convert
        text: String,
    },

    /// Ingest a salary sheet and write accepted rows (or errors) as CSV
    Export {
        /// Input .xlsx, .xls or .csv file
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Use the Preeti template headers
        #[arg(short, long)]
        template: bool,

        /// Write the row errors instead of the accepted rows
        #[arg(short, long)]
        errors: bool,

        /// Convert Preeti name, designation and department to Unicode
        #[arg(short, long)]
        convert_legacy: bool,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: PAYROLL_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { input } => cmd_check(&input).await,

        Commands::Parse {
            input,
            all_sheets,
            convert_legacy,
            output,
        } => cmd_parse(&input, all_sheets, convert_legacy, output.as_deref()).await,

        Commands::Convert { text } => {
            println!("{}", payroll::convert(&text));
            Ok(())
        }

        Commands::Export {
            input,
            output,
            template,
            errors,
            convert_legacy,
        } => cmd_export(&input, &output, template, errors, convert_legacy).await,

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so JSON on stdout stays clean. `RUST_LOG` overrides the
/// default `info` filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn cmd_check(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = UploadFile::open(input).await?;
    let check = validate_structure(&file);

    if check.valid {
        tracing::info!("{}: {}", file.name(), check.message);
        Ok(())
    } else {
        Err(format!("{}: {}", file.name(), check.message).into())
    }
}

async fn cmd_parse(
    input: &Path,
    all_sheets: bool,
    convert_legacy: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = open_checked(input).await?;
    let options = IngestOptions { convert_legacy };

    let json = if all_sheets {
        let result = parse_all_sheets(file, &options).await?;
        serde_json::to_string_pretty(&result)?
    } else {
        let result = parse(file, &options).await?;
        serde_json::to_string_pretty(&result)?
    };

    write_output(&json, output)
}

async fn cmd_export(
    input: &Path,
    output: &Path,
    template: bool,
    errors: bool,
    convert_legacy: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = open_checked(input).await?;
    let result = parse(file, &IngestOptions { convert_legacy }).await?;

    if errors {
        write_errors(fs::File::create(output)?, &result.errors)?;
        tracing::info!("{} error(s) written to {}", result.errors.len(), output.display());
    } else {
        let style = if template { HeaderStyle::Template } else { HeaderStyle::Canonical };
        fs::write(output, employees_to_csv(&result.data, style)?)?;
        tracing::info!("{} row(s) written to {}", result.data.len(), output.display());
    }

    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env().with_port(port);
    payroll::server::start_server(config).await?;
    Ok(())
}

/// Open a file and apply the upload structure check.
async fn open_checked(input: &Path) -> Result<UploadFile, Box<dyn std::error::Error>> {
    let file = UploadFile::open(input).await?;
    let check = validate_structure(&file);
    if !check.valid {
        return Err(check.message.into());
    }
    Ok(file)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            tracing::info!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
