//! Print the remote Zabbix API version.

use std::process;

use anyhow::Context;
use clap::Parser;

use zbxtools::api::ZabbixApi;
use zbxtools::cli::{init_tracing, ConnectionArgs, CONFIG_EPILOG};

#[derive(Parser, Debug)]
#[command(
    name = "zversion",
    version,
    about = "Print the Zabbix API version",
    after_help = CONFIG_EPILOG
)]
struct Cli {
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

    let result = api
        .api_version()
        .context("Could not retrieve Zabbix version");
    api.logout();

    println!("{}", result?);
    Ok(())
}
