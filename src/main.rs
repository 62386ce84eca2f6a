//! Command-line entry point: load the two trace files, validate the target
//! input, run one analysis and print or export the report.

use std::{error::Error, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::error;

use editrace::{analysis, file_io::ab1, AnalysisReport, TargetSpec};

#[derive(Parser)]
#[command(
    version,
    about = "Quantify gene-editing outcomes and rank off-target sites from Sanger trace data"
)]
struct Cli {
    /// Reference (unedited) AB1 trace file.
    reference: PathBuf,
    /// Edited-sample AB1 trace file.
    sample: PathBuf,
    /// Target sequence (A/C/G/T, either case).
    #[arg(long)]
    target: String,
    /// Zero-based inclusive base-offset range within the target to score,
    /// as start,end.
    #[arg(long, value_parser = parse_range)]
    range: (usize, usize),
    /// Print the full report as JSON instead of a table.
    #[arg(long)]
    json: bool,
    /// Repeat for more log output (-v: info, -vv: debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_range(arg: &str) -> Result<(usize, usize), String> {
    match arg.split(',').collect::<Vec<_>>().as_slice() {
        [start, end] => {
            let start = start
                .trim()
                .parse()
                .map_err(|_| format!("invalid range start {start:?}"))?;
            let end = end
                .trim()
                .parse()
                .map_err(|_| format!("invalid range end {end:?}"))?;
            Ok((start, end))
        }
        _ => Err("expected start,end".to_owned()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    // Validate the target input before any trace processing begins.
    let target = TargetSpec::new(&cli.target, cli.range)?;

    let reference = ab1::import_ab1(&cli.reference)?;
    let sample = ab1::import_ab1(&cli.sample)?;

    let analysis = analysis::run_analysis(reference, sample, &target)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&analysis.report)?);
    } else {
        print_table(&analysis.report, &target);
    }

    Ok(())
}

fn print_table(report: &AnalysisReport, target: &TargetSpec) {
    println!("aligned length: {} samples", report.align_length);

    let offsets = target
        .offsets
        .iter()
        .map(|o| format!("{o:>6}"))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{:<16} {:>10} {:>8}  {}", "region", "position", "binding", offsets);

    for region in &report.regions {
        let position = region
            .position
            .map_or_else(|| "-".to_owned(), |p| p.to_string());
        let binding = region
            .binding_score
            .map_or_else(|| "-".to_owned(), |s| format!("{s:.3}"));
        let freqs = region
            .frequencies
            .iter()
            .map(|f| format!("{f:>6.3}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:<16} {:>10} {:>8}  {}",
            region.label, position, binding, freqs
        );
    }
}
