//! Assemble the per-host PDF report from a directory tree.

use std::path::PathBuf;
use std::process;

use chrono::Local;
use clap::Parser;

use zbxtools::cli::init_tracing;
use zbxtools::report::{scan_base_dir, write_report, ReportMeta};

#[derive(Parser, Debug)]
#[command(
    name = "zreport",
    version,
    about = "Generate a paginated PDF report from per-host blurbs and graph images"
)]
struct Cli {
    /// Directory holding one subdirectory per host (info.txt + *.png)
    #[arg(short = 'b', long, default_value = "repdata")]
    base_dir: PathBuf,

    /// Output PDF file
    #[arg(short = 'o', long, default_value = "report.pdf")]
    output: PathBuf,

    /// Report title, shown on the cover and in every page header
    #[arg(long, default_value = "Zabbix Weekly Report")]
    title: String,

    /// Customer line on the cover page
    #[arg(long, default_value = "ACME Inc.")]
    customer: String,

    /// Free-text time-frame descriptor for the cover (defaults to today)
    #[arg(long)]
    timeframe: Option<String>,

    /// Logo PNG for the page header
    #[arg(long)]
    logo: Option<PathBuf>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let sections = scan_base_dir(&cli.base_dir)?;
    if sections.is_empty() {
        tracing::warn!(
            "no host sections under {}, producing a cover-only report",
            cli.base_dir.display()
        );
    }

    let meta = ReportMeta {
        title: cli.title.clone(),
        customer: cli.customer.clone(),
        timeframe: cli
            .timeframe
            .clone()
            .unwrap_or_else(|| Local::now().format("%d/%m/%Y").to_string()),
        logo: cli.logo.clone(),
    };

    write_report(&sections, &meta, &cli.output)?;
    println!("Report generated: {}", cli.output.display());
    Ok(())
}
