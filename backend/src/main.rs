//! Salesreport CLI - per-customer sales reports from CSV and XLSX exports
//!
//! # Commands
//!
//! ```bash
//! salesreport report enero.xlsx febrero.xlsx --mode debito --discount
//! salesreport interactive              # Console prompts, one question at a time
//! salesreport columns ventas.csv      # Inspect an input file
//! salesreport serve                   # Start HTTP server (port 3000)
//! ```
//!
//! Defaults for output folder, format, grouping and port come from
//! `SALESREPORT_*` environment variables (see `config`).

use clap::{Parser, Subcommand};
use salesreport::{
    generate_report, load_table, missing_columns, Grouping, Mode, OutputTarget, ReportFormat,
    ReportSummary, Settings, TransformOptions,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "salesreport")]
#[command(about = "Build per-customer sales reports from CSV and XLSX exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a report from one or more input files
    Report {
        /// Input files (.csv or .xlsx), concatenated in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Report mode: debito, credito or split
        #[arg(short, long)]
        mode: String,

        /// Subtract the absolute discount from gross amounts
        #[arg(short, long)]
        discount: bool,

        /// Group key: name-id or name
        #[arg(short, long)]
        group_by: Option<String>,

        /// Output format: xlsx, csv or json
        #[arg(short, long)]
        format: Option<String>,

        /// Output folder; the file gets the mode's default name
        #[arg(long, conflicts_with = "output")]
        output_dir: Option<PathBuf>,

        /// Output file; the format follows its extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Answer questions on the console to build a report
    Interactive,

    /// Show headers and required-column status of an input file
    Columns {
        /// Input file (.csv or .xlsx)
        input: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present), then read SALESREPORT_* settings
    let settings = Settings::from_env();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            inputs,
            mode,
            discount,
            group_by,
            format,
            output_dir,
            output,
        } => cmd_report(
            &settings,
            &inputs,
            &mode,
            discount,
            group_by.as_deref(),
            format.as_deref(),
            output_dir.as_deref(),
            output,
        ),

        Commands::Interactive => {
            let stdin = io::stdin();
            cmd_interactive(&settings, stdin.lock(), io::stdout())
        }

        Commands::Columns { input } => cmd_columns(&input),

        Commands::Serve { port } => {
            cmd_serve(port.unwrap_or(settings.port), settings.max_upload_bytes()).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_report(
    settings: &Settings,
    inputs: &[PathBuf],
    mode: &str,
    discount: bool,
    group_by: Option<&str>,
    format: Option<&str>,
    output_dir: Option<&Path>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Mode first: nothing is read for an unknown mode
    let mode: Mode = mode.parse()?;
    let grouping = match group_by {
        Some(token) => token.parse::<Grouping>()?,
        None => settings.grouping,
    };

    let target = match output {
        Some(path) => OutputTarget::file(path)?,
        None => {
            let format = match format {
                Some(token) => token.parse::<ReportFormat>()?,
                None => settings.format,
            };
            let dir = output_dir.unwrap_or(settings.output_dir.as_path());
            OutputTarget::in_dir(dir, mode, format)
        }
    };

    let options = TransformOptions::new(mode)
        .with_discount(discount)
        .with_grouping(grouping);

    let summary = generate_report(inputs, &options, &target)?;
    print_summary(&summary);
    Ok(())
}

fn cmd_interactive<R: BufRead, W: Write>(
    settings: &Settings,
    input: R,
    output: W,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut prompter = Prompter::new(input, output);
    prompter.say("== Reporte de Ventas ==")?;
    let answers = prompter.collect(settings)?;

    let target = OutputTarget::in_dir(&answers.output_dir, answers.options.mode, settings.format);
    let summary = generate_report(&answers.inputs, &answers.options, &target)?;
    if summary.header_only {
        prompter.say("No records for this report: the file only has headers.")?;
    }
    prompter.say(&format!("Report saved to: {}", summary.output.display()))?;
    Ok(())
}

fn cmd_columns(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading: {}", input.display());

    let table = load_table(input)?;
    for source in &table.sources {
        eprintln!("   Format: {}", source.format);
        if let Some(ref encoding) = source.encoding {
            eprintln!("   Encoding: {}", encoding);
        }
        if let Some(delimiter) = source.delimiter {
            eprintln!("   Delimiter: '{}'", salesreport::transform::format_delimiter(delimiter));
        }
        eprintln!("   Rows: {}", source.row_count);
    }

    println!("Columns:");
    for header in &table.headers {
        println!("  {}", header);
    }

    let missing = missing_columns(&table.headers);
    if missing.is_empty() {
        eprintln!("✅ All required columns present");
    } else {
        eprintln!("⚠️  Missing required columns: {}", missing.join(", "));
    }
    Ok(())
}

async fn cmd_serve(port: u16, max_upload_bytes: usize) -> Result<(), Box<dyn std::error::Error>> {
    salesreport::server::start_server(port, max_upload_bytes).await
}

fn print_summary(summary: &ReportSummary) {
    eprintln!("\n📊 Summary ({})", summary.mode.display_name());
    eprintln!("   Input rows:        {}", summary.stats.input_rows);
    eprintln!("   Rows in mode:      {}", summary.stats.retained_rows);
    eprintln!("   Names unified:     {}", summary.stats.consolidated_names);
    eprintln!("   Customers:         {}", summary.rows);
    if summary.header_only {
        eprintln!("   ⚠️  No records: header-only {} written", summary.format);
    }
    println!("{}", summary.output.display());
}

// =============================================================================
// Console prompter
// =============================================================================

/// Answers gathered by the console prompter.
#[derive(Debug)]
struct InteractiveAnswers {
    inputs: Vec<PathBuf>,
    options: TransformOptions,
    output_dir: PathBuf,
}

struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{}", line)
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    fn collect(&mut self, settings: &Settings) -> Result<InteractiveAnswers, Box<dyn std::error::Error>> {
        let count: usize = self
            .ask("How many files do you want to process? ")?
            .parse()
            .map_err(|_| "expected a number of files")?;
        if count == 0 {
            return Err(salesreport::PipelineError::NoInputFiles.into());
        }

        let mut inputs = Vec::with_capacity(count);
        for i in 1..=count {
            let path = PathBuf::from(self.ask(&format!("Path of file {}: ", i))?);
            if !path.is_file() {
                return Err(format!("'{}' is not a readable file", path.display()).into());
            }
            inputs.push(path);
        }

        let mode: Mode = self.ask("Mode (debito/credito/split): ")?.parse()?;
        let discount = self.ask("Subtract discount? (s/n): ")?.to_lowercase() == "s";

        let dir = self.ask(&format!("Output folder [{}]: ", settings.output_dir.display()))?;
        let output_dir = if dir.is_empty() {
            settings.output_dir.clone()
        } else {
            PathBuf::from(dir)
        };

        Ok(InteractiveAnswers {
            inputs,
            options: TransformOptions::new(mode)
                .with_discount(discount)
                .with_grouping(settings.grouping),
            output_dir,
        })
    }
}
