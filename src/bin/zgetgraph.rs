//! Download a rendered graph PNG from the Zabbix frontend.

use std::fs;
use std::io::{self, Write};
use std::process;

use anyhow::Context;
use clap::Parser;

use zbxtools::api::ZabbixApi;
use zbxtools::cli::{init_tracing, ConnectionArgs, CONFIG_EPILOG};
use zbxtools::graph::{download_graph, GraphRequest};

#[derive(Parser, Debug)]
#[command(
    name = "zgetgraph",
    version,
    about = "Downloads a graph from the Zabbix frontend",
    after_help = CONFIG_EPILOG
)]
struct Cli {
    /// The graph that we are going to download
    graphid: u64,

    /// Filename to save the graph to, use - for stdout
    #[arg(short = 'f', long, required = true)]
    filename: String,

    /// Start time for the graph in Zabbix notation (default is now-1h)
    #[arg(short = 's', long, default_value = "now-1h")]
    starttime: String,

    /// End time for the graph in Zabbix notation (default is now)
    #[arg(short = 't', long, default_value = "now")]
    endtime: String,

    /// Width of the graph (defaults to the graph default)
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Height of the graph (defaults to the graph default)
    #[arg(short = 'H', long)]
    height: Option<u32>,

    #[command(flatten)]
    connection: ConnectionArgs,
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
    let config = cli.connection.resolve()?;
    let mut api = ZabbixApi::new(&config)?;
    api.login(&config)?;

    let request = GraphRequest {
        graphid: cli.graphid,
        from: cli.starttime.clone(),
        to: cli.endtime.clone(),
        width: cli.width,
        height: cli.height,
    };
    let result = download_graph(&mut api, &config, &request);
    api.logout();
    let png = result?;

    if cli.filename == "-" {
        io::stdout()
            .lock()
            .write_all(&png)
            .context("writing image to stdout")?;
    } else {
        fs::write(&cli.filename, &png).with_context(|| format!("writing {}", cli.filename))?;
    }
    Ok(())
}
