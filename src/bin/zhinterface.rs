//! Retrieve the interface(s) for a host.

use std::process;

use clap::Parser;

use zbxtools::api::ZabbixApi;
use zbxtools::cli::{init_tracing, ConnectionArgs, CONFIG_EPILOG};
use zbxtools::interface::{fetch_interfaces, format_interface, InterfaceFormat};

#[derive(Parser, Debug)]
#[command(
    name = "zhinterface",
    version,
    about = "Retrieve all the interface(s) for a host",
    after_help = CONFIG_EPILOG
)]
struct Cli {
    /// Hostname to find the interfaces for
    hostname: String,

    /// Return numeric interface id instead of interface name
    #[arg(short = 'n', long)]
    numeric: bool,

    /// Return interface id, ip and type
    #[arg(short = 'e', long)]
    extended: bool,

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

    let result = fetch_interfaces(&mut api, &cli.hostname);
    api.logout();
    let interfaces = result?;

    let format = if cli.extended {
        InterfaceFormat::Extended
    } else if cli.numeric {
        InterfaceFormat::Numeric
    } else {
        InterfaceFormat::Default
    };
    for interface in &interfaces {
        println!("{}", format_interface(interface, format));
    }
    Ok(())
}
