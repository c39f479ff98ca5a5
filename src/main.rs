use clap::Parser;
use log::info;
use marker_coverage::batch::{collect_inputs, run_batch, write_csv_report, BatchOptions};
use marker_coverage::detector::load_params;
use marker_coverage::image::io::write_json_file;
use marker_coverage::{DetectorParams, MarkerDetector};
use std::path::PathBuf;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "marker-coverage")]
#[command(about = "Measure how much of a photograph a 3x3 color marker covers")]
#[command(version)]
struct Cli {
    /// Verbose per-stage logging.
    #[arg(long)]
    debug: bool,

    /// Write mask, quad, warp, crop and clip images for each input.
    #[arg(long)]
    save_debug: bool,

    /// Directory for debug images (default: next to each input).
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// CSV report path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// JSON report path.
    #[arg(long)]
    json: Option<PathBuf>,

    /// JSON file overriding detector parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image files or directories.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> CliResult<i32> {
    let params = match &cli.config {
        Some(path) => load_params(path)?,
        None => DetectorParams::default(),
    };
    let detector = MarkerDetector::new(params);

    let mut paths = Vec::new();
    for input in &cli.inputs {
        paths.extend(collect_inputs(input)?);
    }
    info!("processing {} image(s)", paths.len());

    let options = BatchOptions {
        artifacts_dir: cli.artifacts_dir.clone(),
        save_debug: cli.save_debug,
    };
    let rows = run_batch(&paths, &detector, &options);

    for row in &rows {
        if row.found {
            println!("{} {}%", row.path, row.percent);
        } else {
            println!("{} no marker found", row.path);
        }
    }
    let found = rows.iter().filter(|r| r.found).count();
    println!("Found {}/{}", found, rows.len());

    if let Some(path) = &cli.report {
        write_csv_report(path, &rows)?;
        info!("CSV report written to {}", path.display());
    }
    if let Some(path) = &cli.json {
        write_json_file(path, &rows)?;
        info!("JSON report written to {}", path.display());
    }

    Ok(if found == rows.len() { 0 } else { 2 })
}
