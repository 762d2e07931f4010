//! csv-combine CLI - merge delimited files into one xlsx workbook

use clap::Parser;
use csv_combine::{CombineReport, Combiner, Detector, InputFile, OutputTarget, Outcome};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Combine CSV files into one Excel file.
///
/// Every input gets its own sheet named `sheet_<n>` after its position on the
/// command line. The delimiter of each file (comma, tab, semicolon, pipe or
/// space) is detected automatically.
#[derive(Parser, Debug)]
#[command(name = "csv-combine")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file(s), in sheet order
    files: Vec<PathBuf>,

    /// Output workbook path
    #[arg(short = 'o', long, default_value = "combined.xlsx")]
    output: PathBuf,

    /// Number of leading lines sampled for delimiter detection
    #[arg(short = 'n', long, default_value = "5")]
    sample_lines: usize,

    /// Output format: text (default) or json
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,

    /// Only print the detected delimiter of each file; no workbook is written
    #[arg(long)]
    delimiter_only: bool,

    /// Show per-file details and info-level logs
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.files.is_empty() {
        eprintln!("Please supply csv files to combine them into one Excel file!");
        return ExitCode::FAILURE;
    }

    let result = if args.delimiter_only {
        print_delimiters(&args)
    } else {
        run(&args)
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_delimiters(args: &Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut detector = Detector::new();
    detector.sample_lines(args.sample_lines);

    let mut exit_code = ExitCode::SUCCESS;
    for path in &args.files {
        let detection = InputFile::open(path)
            .and_then(|mut file| detector.detect_with_scores(file.reader_mut()));

        match detection {
            Ok(detection) if args.verbose => {
                let scores: Vec<String> = detection
                    .scores
                    .iter()
                    .map(|(delimiter, score)| format!("{delimiter}={score}"))
                    .collect();
                println!(
                    "{}: {:?} ({} lines sampled; {})",
                    path.display(),
                    detection.delimiter.as_char(),
                    detection.sampled_lines,
                    scores.join(" ")
                );
            }
            Ok(detection) => println!("{:?}", detection.delimiter.as_char()),
            Err(e) => {
                eprintln!("Error processing {}: {}", path.display(), e);
                exit_code = ExitCode::FAILURE;
            }
        }
    }

    Ok(exit_code)
}

fn run(args: &Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Unopenable paths fail their own sheet, not the batch.
    let mut files: Vec<_> = args.files.iter().map(InputFile::open_deferred).collect();

    let mut combiner = Combiner::new();
    combiner.sample_lines(args.sample_lines);

    let report = combiner.combine(&mut files, &OutputTarget::path(&args.output))?;

    match args.format {
        OutputFormat::Text => print_text_output(&args.output, &report, args.verbose),
        OutputFormat::Json => print_json_output(&args.output, &report),
    }

    Ok(if report.is_all_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_text_output(output: &Path, report: &CombineReport, verbose: bool) {
    if !report.successes.is_empty() {
        println!(
            "Successfully combined csv files into one Excel file! Processed sheets: {}",
            report.successes.join(", ")
        );
        println!("Saved to: {}", output.display());
    }

    if !report.failures.is_empty() {
        eprintln!(
            "Failed to process the following sheets: {}",
            report.failures.join(", ")
        );
    }

    if verbose {
        for record in &report.records {
            match &record.outcome {
                Outcome::Success {
                    delimiter,
                    rows,
                    columns,
                    skipped_rows,
                } => println!(
                    "  {} <- {}: {} rows x {} columns, delimiter {}, {} rows skipped",
                    record.id, record.source, rows, columns, delimiter, skipped_rows
                ),
                Outcome::Failure(kind) => {
                    println!("  {} <- {}: failed ({})", record.id, record.source, kind);
                }
            }
        }
    }
}

fn print_json_output(output: &Path, report: &CombineReport) {
    let quoted = |ids: &[String]| {
        ids.iter()
            .map(|id| format!("\"{id}\""))
            .collect::<Vec<_>>()
            .join(",")
    };

    let records: Vec<String> = report
        .records
        .iter()
        .map(|record| match &record.outcome {
            Outcome::Success {
                delimiter,
                rows,
                columns,
                skipped_rows,
            } => format!(
                concat!(
                    r#"{{"sheet":"{}","source":{:?},"status":"success","delimiter":{:?},"#,
                    r#""rows":{},"columns":{},"skipped_rows":{}}}"#
                ),
                record.id,
                record.source,
                delimiter.as_char().to_string(),
                rows,
                columns,
                skipped_rows
            ),
            Outcome::Failure(kind) => format!(
                r#"{{"sheet":"{}","source":{:?},"status":"failure","reason":"{}"}}"#,
                record.id,
                record.source,
                kind.as_str()
            ),
        })
        .collect();

    println!(
        r#"{{"output":{:?},"successes":[{}],"failures":[{}],"records":[{}]}}"#,
        output.display().to_string(),
        quoted(&report.successes),
        quoted(&report.failures),
        records.join(",")
    );
}
