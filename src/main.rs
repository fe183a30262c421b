//! genedeck CLI - one accession in, one populated deck out.

use clap::Parser;
use genedeck::report::{self, DataSources, ReportOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "genedeck")]
#[command(about = "Populate a PowerPoint template with protein annotation data")]
#[command(version)]
struct Cli {
    /// UniProt accession of the protein to report on (e.g. P04637)
    accession: String,

    /// Template presentation to populate
    #[arg(long, env = "GENEDECK_TEMPLATE", default_value = "powerpoints/input.pptx")]
    template: PathBuf,

    /// Directory receiving the generated presentation
    #[arg(long, env = "GENEDECK_OUT_DIR", default_value = "powerpoints")]
    out_dir: PathBuf,

    /// Directory receiving the intermediate chart images
    #[arg(long, env = "GENEDECK_SCRATCH_DIR", default_value = "scratch")]
    scratch_dir: PathBuf,

    /// HTTP timeout in seconds
    #[arg(long, env = "GENEDECK_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Print each slide's text boxes with their ordinals, then exit
    /// without fetching anything
    #[arg(long)]
    list_text_boxes: bool,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: &Cli) -> genedeck::Result<()> {
    if cli.list_text_boxes {
        for (slide, boxes) in report::list_text_boxes(&cli.template)? {
            println!("Slide {slide}:");
            for (ordinal, text) in boxes.iter().enumerate() {
                println!("  Text Box {}: {}", ordinal + 1, text);
            }
        }
        return Ok(());
    }

    let opts = ReportOptions {
        accession: cli.accession.clone(),
        template: cli.template.clone(),
        out_dir: cli.out_dir.clone(),
        scratch_dir: cli.scratch_dir.clone(),
    };
    let sources = DataSources::new(Duration::from_secs(cli.timeout))?;
    let output = report::generate(&opts, &sources)?;
    println!("{}", output.display());
    Ok(())
}

fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}
